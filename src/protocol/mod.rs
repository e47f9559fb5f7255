//! Protocol implementation module
//!
//! This module defines the overflow-area wire format: bit/byte conversions,
//! the Hamming codec, payload framing, and the iBeacon frame it travels next to.

pub mod advertisement;
pub mod bits;
pub mod hamming;
pub mod ibeacon;
pub mod overflow;

pub use self::advertisement::{AdvertisementKind, AdvertisementReport};
pub use self::bits::{bits_to_bytes, bytes_to_bits, BitOrder};
pub use self::hamming::{DecodeOutcome, HammingCodec};
pub use self::ibeacon::IBeaconFrame;
pub use self::overflow::{interpret, ExtractedPayload, Extraction, OverflowPayloadExtractor};
