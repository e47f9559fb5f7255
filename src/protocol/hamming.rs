//! Hamming forward error correction for overflow-area payloads.
//!
//! Codeword layout: a classical Hamming core (parity bits at the 1-indexed
//! power-of-two positions, data bits everywhere else) followed by one extra
//! check bit. The extra bit is the OR of the core, not its XOR. Broadcasters in
//! the field compute it this way, so it is kept bit-exact. It only catches a
//! payload that collapsed to all zeros (or a corrupted check bit) and gives no
//! real double-error detection. Revisit it together with the wire format.
//!
//! Bits are `u8` values, one bit per element.

/// Number of parity bits protecting `data_len` data bits: the smallest `m`
/// with `2^m - m - 1 >= data_len`.
pub fn parity_bit_count(data_len: usize) -> usize {
    let mut m = 0;
    while (1usize << m) < data_len + m + 1 {
        m += 1;
    }
    m
}

/// Parity count as derived by the receiver from the full codeword length
/// (check bit included): the smallest `m` with `2^m > len`. It can exceed the
/// sender's count by one; groups past the end of the core are empty.
fn receiver_parity_count(codeword_len: usize) -> usize {
    (usize::BITS - codeword_len.leading_zeros()) as usize
}

/// Even parity over the core bits covered by parity group `group`: every
/// 1-indexed position with bit `group` set.
fn group_parity(core: &[u8], group: usize) -> u8 {
    let mask = 1usize << group;
    core.iter()
        .enumerate()
        .filter(|(idx, _)| (idx + 1) & mask != 0)
        .fold(0, |acc, (_, &bit)| acc ^ (bit & 1))
}

/// OR of all bits.
#[inline]
fn or_reduce(bits: &[u8]) -> u8 {
    bits.iter().fold(0, |acc, &bit| acc | (bit & 1))
}

/// Encodes data bits into a codeword of `len + m + 1` bits.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let parity_bits = parity_bit_count(data.len());
    let core_len = data.len() + parity_bits;

    let mut codeword = Vec::with_capacity(core_len + 1);
    let mut data_bits = data.iter();
    for position in 1..=core_len {
        if position.is_power_of_two() {
            codeword.push(0);
        } else {
            codeword.push(data_bits.next().map_or(0, |bit| bit & 1));
        }
    }

    for group in 0..parity_bits {
        let position = 1usize << group;
        codeword[position - 1] = group_parity(&codeword, group);
    }

    let check = or_reduce(&codeword);
    codeword.push(check);
    codeword
}

/// Result of decoding a codeword
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Syndrome was zero and the check bit matched
    Clean(Vec<u8>),
    /// One bit at the given 1-indexed core position was flipped back
    Corrected { position: usize, data: Vec<u8> },
    /// The syndrome pointed outside the core
    SyndromeOutOfRange { syndrome: usize },
    /// The check bit disagreed with the recovered data
    CheckMismatch,
}

impl DecodeOutcome {
    /// Recovered data bits; empty when decoding failed
    pub fn into_bits(self) -> Vec<u8> {
        match self {
            DecodeOutcome::Clean(data) | DecodeOutcome::Corrected { data, .. } => data,
            DecodeOutcome::SyndromeOutOfRange { .. } | DecodeOutcome::CheckMismatch => Vec::new(),
        }
    }

    /// Whether usable data was recovered
    pub fn is_ok(&self) -> bool {
        matches!(self, DecodeOutcome::Clean(_) | DecodeOutcome::Corrected { .. })
    }
}

/// Decodes a codeword, correcting up to one flipped core bit.
pub fn decode_detailed(codeword: &[u8]) -> DecodeOutcome {
    let Some((&received_check, core)) = codeword.split_last() else {
        return DecodeOutcome::CheckMismatch;
    };
    let mut core: Vec<u8> = core.iter().map(|bit| bit & 1).collect();

    let mut syndrome = 0usize;
    for group in 0..receiver_parity_count(codeword.len()) {
        if group_parity(&core, group) == 1 {
            syndrome += 1 << group;
        }
    }

    let corrected = if syndrome != 0 {
        match core.get_mut(syndrome - 1) {
            Some(bit) => *bit ^= 1,
            None => return DecodeOutcome::SyndromeOutOfRange { syndrome },
        }
        Some(syndrome)
    } else {
        None
    };

    let data: Vec<u8> = core
        .iter()
        .enumerate()
        .filter(|(idx, _)| !(idx + 1).is_power_of_two())
        .map(|(_, &bit)| bit)
        .collect();

    if or_reduce(&data) != received_check & 1 {
        return DecodeOutcome::CheckMismatch;
    }

    match corrected {
        Some(position) => DecodeOutcome::Corrected { position, data },
        None => DecodeOutcome::Clean(data),
    }
}

/// Decodes a codeword. An empty result means no usable data.
pub fn decode(codeword: &[u8]) -> Vec<u8> {
    decode_detailed(codeword).into_bits()
}

/// Stateless handle over the codec functions
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingCodec;

impl HammingCodec {
    /// Creates a new codec
    pub fn new() -> Self {
        HammingCodec
    }

    /// See [`encode`]
    pub fn encode(&self, data: &[u8]) -> Vec<u8> {
        encode(data)
    }

    /// See [`decode`]
    pub fn decode(&self, codeword: &[u8]) -> Vec<u8> {
        decode(codeword)
    }

    /// Codeword length in bits for `data_len` data bits
    pub fn codeword_len(&self, data_len: usize) -> usize {
        data_len + parity_bit_count(data_len) + 1
    }
}
