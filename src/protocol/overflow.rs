//! Overflow-area payload framing
//!
//! The overflow area of an Apple manufacturer-data advertisement carries a
//! small Hamming-coded payload:
//!
//! ```text
//! | header (8 bytes) | codeword: sentinel 0xAA + payload, Hamming coded | padding |
//! ```
//!
//! Broadcasters lay out every byte with the opposite per-byte bit order from
//! the one the receiving Bluetooth stack reports, so the raw buffer is bit
//! reversed byte by byte before the header is skipped.

use tracing::{debug, trace};

use crate::core::{BeaconIdentity, Error, Result};
use super::bits::{bits_to_bytes, bytes_to_bits, BitOrder};
use super::hamming::{self, DecodeOutcome};

/// Reserved framing bytes ahead of the codeword
pub const HEADER_BYTES: usize = 8;

/// Marker byte prefixed to every payload of this protocol
pub const SENTINEL: u8 = 0xAA;

/// major (2) + minor (2) + tx power (1)
pub const DEFAULT_PAYLOAD_BYTES: usize = 5;

/// Grouping of decoded data bits into bytes, as the broadcaster packs them
const PAYLOAD_BIT_ORDER: BitOrder = BitOrder::LsbFirst;

/// Payload bytes that followed the sentinel
pub type ExtractedPayload = Vec<u8>;

/// Outcome of one extraction attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Decoded payload, sentinel removed
    Payload(ExtractedPayload),
    /// The codeword could not be corrected or verified
    DecodeFailure,
    /// Decoded fine but carries another protocol's data
    SentinelMismatch { found: u8 },
}

impl Extraction {
    /// The payload, if extraction succeeded
    pub fn into_payload(self) -> Option<ExtractedPayload> {
        match self {
            Extraction::Payload(payload) => Some(payload),
            Extraction::DecodeFailure | Extraction::SentinelMismatch { .. } => None,
        }
    }
}

/// Hamming core bits for `payload_byte_count` bytes plus the sentinel
pub fn window_bits(payload_byte_count: usize) -> usize {
    let data_bits = 8 * (payload_byte_count + 1);
    data_bits + hamming::parity_bit_count(data_bits)
}

/// Full codeword bits: the window plus the trailing check bit
pub fn codeword_bits(payload_byte_count: usize) -> usize {
    window_bits(payload_byte_count) + 1
}

/// Minimum raw buffer length for `payload_byte_count`
pub fn required_len(payload_byte_count: usize) -> usize {
    HEADER_BYTES + (codeword_bits(payload_byte_count) + 7) / 8
}

/// Reverses the bit order inside every byte.
pub fn normalize(raw: &[u8]) -> Vec<u8> {
    bits_to_bytes(&bytes_to_bits(raw, BitOrder::MsbFirst), BitOrder::LsbFirst)
}

/// Runs the full extraction, keeping the rejection reason.
pub fn inspect(raw: &[u8], payload_byte_count: usize) -> Result<Extraction> {
    let needed = required_len(payload_byte_count);
    if raw.len() < needed {
        return Err(Error::malformed(needed, raw.len()));
    }

    let normalized = normalize(raw);
    let mut codeword = bytes_to_bits(&normalized[HEADER_BYTES..], BitOrder::LsbFirst);
    codeword.truncate(codeword_bits(payload_byte_count));

    let outcome = hamming::decode_detailed(&codeword);
    if let DecodeOutcome::Corrected { position, .. } = &outcome {
        trace!(position, "Corrected single-bit error in overflow codeword");
    }
    let data = outcome.into_bits();
    if data.is_empty() {
        return Ok(Extraction::DecodeFailure);
    }

    let bytes = bits_to_bytes(&data, PAYLOAD_BIT_ORDER);
    Ok(match bytes.split_first() {
        Some((&SENTINEL, payload)) => Extraction::Payload(payload.to_vec()),
        Some((&found, _)) => Extraction::SentinelMismatch { found },
        None => Extraction::DecodeFailure,
    })
}

/// Extracts the payload from a raw overflow-area buffer (leading `0x01`
/// marker already stripped).
///
/// Returns `Ok(None)` for corrupted or foreign advertisements and
/// `Err(Error::MalformedInput)` when the buffer is too short to hold a codeword.
pub fn extract(raw: &[u8], payload_byte_count: usize) -> Result<Option<ExtractedPayload>> {
    let extraction = inspect(raw, payload_byte_count)?;
    match &extraction {
        Extraction::Payload(_) => {}
        Extraction::DecodeFailure => {
            debug!("Overflow area advert does not carry beacon data or it is corrupted");
        }
        Extraction::SentinelMismatch { found } => {
            debug!(found = *found, "Overflow area advert is not ours");
        }
    }
    Ok(extraction.into_payload())
}

/// Interprets a five-byte payload as major, minor and transmit power.
///
/// Transmit power is always broadcast as a negative dBm value and is read as
/// `byte - 256`.
pub fn interpret(payload: &[u8]) -> Option<BeaconIdentity> {
    if payload.len() != DEFAULT_PAYLOAD_BYTES {
        return None;
    }
    Some(BeaconIdentity {
        major: u16::from_be_bytes([payload[0], payload[1]]),
        minor: u16::from_be_bytes([payload[2], payload[3]]),
        tx_power: payload[4] as i16 - 256,
    })
}

/// Lays out `data` (sentinel included) the way a broadcaster does, behind
/// `header`.
fn frame(header: [u8; HEADER_BYTES], data: &[u8]) -> Vec<u8> {
    let codeword = hamming::encode(&bytes_to_bits(data, PAYLOAD_BIT_ORDER));
    let mut raw = header.to_vec();
    raw.extend(bits_to_bytes(&codeword, BitOrder::MsbFirst));
    raw
}

/// Builds the raw overflow-area buffer that carries `payload`.
pub fn encode_payload(payload: &[u8], payload_byte_count: usize) -> Result<Vec<u8>> {
    if payload.len() != payload_byte_count {
        return Err(Error::invalid_payload(format!(
            "expected {} bytes, got {}",
            payload_byte_count,
            payload.len()
        )));
    }
    let mut data = Vec::with_capacity(payload.len() + 1);
    data.push(SENTINEL);
    data.extend_from_slice(payload);
    Ok(frame([0; HEADER_BYTES], &data))
}

/// Payload bytes for a beacon identity, the inverse of [`interpret`]
pub fn identity_payload(identity: &BeaconIdentity) -> Result<ExtractedPayload> {
    if !(-256..=-1).contains(&identity.tx_power) {
        return Err(Error::invalid_payload(format!(
            "tx power {} dBm cannot be broadcast",
            identity.tx_power
        )));
    }
    let mut payload = Vec::with_capacity(DEFAULT_PAYLOAD_BYTES);
    payload.extend_from_slice(&identity.major.to_be_bytes());
    payload.extend_from_slice(&identity.minor.to_be_bytes());
    payload.push((identity.tx_power + 256) as u8);
    Ok(payload)
}

/// Extractor configured for a fixed payload size
#[derive(Debug, Clone, Copy)]
pub struct OverflowPayloadExtractor {
    payload_byte_count: usize,
}

impl Default for OverflowPayloadExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PAYLOAD_BYTES)
    }
}

impl OverflowPayloadExtractor {
    /// Creates an extractor for `payload_byte_count` bytes after the sentinel
    pub fn new(payload_byte_count: usize) -> Self {
        OverflowPayloadExtractor { payload_byte_count }
    }

    pub fn payload_byte_count(&self) -> usize {
        self.payload_byte_count
    }

    pub fn required_len(&self) -> usize {
        required_len(self.payload_byte_count)
    }

    pub fn extract(&self, raw: &[u8]) -> Result<Option<ExtractedPayload>> {
        extract(raw, self.payload_byte_count)
    }

    pub fn inspect(&self, raw: &[u8]) -> Result<Extraction> {
        inspect(raw, self.payload_byte_count)
    }

    /// Extracts and interprets in one step
    pub fn identify(&self, raw: &[u8]) -> Result<Option<BeaconIdentity>> {
        Ok(self.extract(raw)?.as_deref().and_then(interpret))
    }

    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        encode_payload(payload, self.payload_byte_count)
    }
}
