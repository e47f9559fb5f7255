//! Bit/byte conversions.
//!
//! Bit sequences are slices of `u8` holding one bit per element (0 or 1).

/// Per-byte bit decomposition order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// Bit 7 of each byte comes first
    MsbFirst,
    /// Bit 0 of each byte comes first
    LsbFirst,
}

impl BitOrder {
    /// Shift of the `index`-th bit (0..8) of a byte under this order
    #[inline]
    fn shift(self, index: usize) -> usize {
        match self {
            BitOrder::MsbFirst => 7 - index,
            BitOrder::LsbFirst => index,
        }
    }
}

/// Expands bytes into bits, eight per byte.
pub fn bytes_to_bits(bytes: &[u8], order: BitOrder) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for index in 0..8 {
            bits.push((byte >> order.shift(index)) & 1);
        }
    }
    bits
}

/// Packs bits into bytes. A trailing partial byte is zero padded.
pub fn bits_to_bytes(bits: &[u8], order: BitOrder) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk.iter().enumerate().fold(0u8, |byte, (index, &bit)| {
                byte | ((bit & 1) << order.shift(index))
            })
        })
        .collect()
}
