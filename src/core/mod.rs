//! Core types and traits for overflow beacon tracking
//!
//! This module contains the fundamental building blocks used throughout the library.

pub mod error;
pub mod types;
pub mod serde;

pub use self::error::{Error, Result};
pub use self::types::{
    BeaconIdentity,
    BeaconRecord,
    IdentityKey,
    IntakePath,
    ProximityUuid,
    Sighting,
    TrackerConfig,
};

/// Apple's Bluetooth SIG company identifier
pub const APPLE_COMPANY_ID: u16 = 0x004C;

/// Default record expiration in seconds
pub const DEFAULT_EXPIRATION_SECS: u64 = 30;

/// Largest payload whose codeword fits a 16-byte overflow area after its header
pub const MAX_PAYLOAD_BYTES: usize = 6;

/// Proximity UUID shared by the tracked beacon fleet
pub const DEFAULT_PROXIMITY_UUID: [u8; 16] = [
    0x2f, 0x23, 0x44, 0x54, 0xcf, 0x6d, 0x4a, 0x0f,
    0xad, 0xf2, 0xf4, 0x91, 0x1b, 0xa9, 0xff, 0xa6,
];
