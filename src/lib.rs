//! Overflow Beacon: BLE overflow-area beacon decoding and nearby beacon tracking
//!
//! This library recovers a beacon's major, minor and transmit power from the
//! Hamming-coded payload some broadcasters hide in the Apple "overflow area",
//! and keeps a time-bounded registry of beacons seen on either that path or a
//! plain iBeacon frame.
pub mod core;
pub mod protocol;
pub mod tracker;

// Re-export commonly used items
pub use self::core::{BeaconIdentity, BeaconRecord, Error, IdentityKey, Result, Sighting, TrackerConfig};
pub use self::protocol::{HammingCodec, OverflowPayloadExtractor};
pub use self::tracker::{BeaconTracker, NearbyBeaconRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
