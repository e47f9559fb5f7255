use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use serde::{Serialize, Deserialize};

use super::error::{Error, Result};

/// Identity of a tracked beacon: its `(major, minor)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    pub major: u16,
    pub minor: u16,
}

impl IdentityKey {
    /// Creates a new identity key
    pub fn new(major: u16, minor: u16) -> Self {
        IdentityKey { major, minor }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.major, self.minor)
    }
}

/// The intake path a sighting arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntakePath {
    /// A primary iBeacon frame, decoded by the adapter
    IBeacon,
    /// A Hamming-coded payload carried in the overflow area
    OverflowArea,
}

/// Decoded beacon identity fields.
///
/// `tx_power` is wider than a signed byte: the overflow-area protocol
/// interprets its transmit power byte as `byte - 256`, which spans `-256..=-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconIdentity {
    pub major: u16,
    pub minor: u16,
    pub tx_power: i16,
}

impl BeaconIdentity {
    /// Returns the identity key of this beacon
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(self.major, self.minor)
    }
}

/// One observation of a beacon, as carried on an intake channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
    pub major: u16,
    pub minor: u16,
    pub tx_power: i16,
    pub rssi: i32,
    pub source: IntakePath,
}

impl Sighting {
    /// Creates a sighting from decoded identity fields and a signal strength
    pub fn new(identity: BeaconIdentity, rssi: i32, source: IntakePath) -> Self {
        Sighting {
            major: identity.major,
            minor: identity.minor,
            tx_power: identity.tx_power,
            rssi,
            source,
        }
    }

    /// Returns the identity key of the sighted beacon
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(self.major, self.minor)
    }
}

/// Latest sighting of a beacon held by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconRecord {
    /// Registry key
    pub key: IdentityKey,
    pub major: u16,
    pub minor: u16,
    pub tx_power: i16,
    pub rssi: i32,
    /// Time of the latest sighting
    #[serde(serialize_with = "super::serde::serialize_time")]
    #[serde(deserialize_with = "super::serde::deserialize_time")]
    pub observed_at: SystemTime,
    /// Intake path of the latest sighting
    pub source: Option<IntakePath>,
}

impl BeaconRecord {
    /// Age of this record relative to `now`; zero if the clock went backwards
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.observed_at)
            .unwrap_or(Duration::from_secs(0))
    }
}

/// 128-bit iBeacon proximity UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProximityUuid(pub [u8; 16]);

impl ProximityUuid {
    /// Raw bytes in transmission order
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl FromStr for ProximityUuid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 36 {
            return Err(Error::invalid_uuid(format!("expected 36 characters, got {}", s.len())));
        }
        for idx in [8, 13, 18, 23] {
            if s.as_bytes()[idx] != b'-' {
                return Err(Error::invalid_uuid(format!("expected '-' at offset {}", idx)));
            }
        }

        let hex: Vec<u8> = s.bytes().filter(|&b| b != b'-').collect();
        if hex.len() != 32 || !hex.iter().all(u8::is_ascii_hexdigit) {
            return Err(Error::invalid_uuid(s));
        }

        let mut bytes = [0u8; 16];
        for (i, pair) in hex.chunks(2).enumerate() {
            let digits = std::str::from_utf8(pair).map_err(|_| Error::invalid_uuid(s))?;
            bytes[i] = u8::from_str_radix(digits, 16).map_err(|_| Error::invalid_uuid(s))?;
        }
        Ok(ProximityUuid(bytes))
    }
}

impl TryFrom<String> for ProximityUuid {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ProximityUuid> for String {
    fn from(uuid: ProximityUuid) -> Self {
        uuid.to_string()
    }
}

impl fmt::Display for ProximityUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Configuration for the beacon tracker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Proximity UUID accepted on the iBeacon intake path
    pub proximity_uuid: ProximityUuid,
    /// Records older than this are swept on the next update
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub expiration: Duration,
    /// Payload bytes carried after the sentinel in the overflow area
    pub payload_byte_count: usize,
    /// Capacity of each intake channel
    pub channel_capacity: usize,
}

impl TrackerConfig {
    /// Checks that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.expiration.is_zero() {
            return Err(Error::config("Expiration must be greater than zero"));
        }
        if self.payload_byte_count == 0 || self.payload_byte_count > super::MAX_PAYLOAD_BYTES {
            return Err(Error::config(format!(
                "Payload byte count must be between 1 and {}, got {}",
                super::MAX_PAYLOAD_BYTES,
                self.payload_byte_count
            )));
        }
        if self.channel_capacity == 0 {
            return Err(Error::config("Channel capacity must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            proximity_uuid: ProximityUuid(super::DEFAULT_PROXIMITY_UUID),
            expiration: Duration::from_secs(super::DEFAULT_EXPIRATION_SECS),
            payload_byte_count: crate::protocol::overflow::DEFAULT_PAYLOAD_BYTES,
            channel_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_display() {
        assert_eq!(IdentityKey::new(2, 7777).to_string(), "2-7777");
    }

    #[test]
    fn test_uuid_parse_and_display() {
        let text = "2f234454-cf6d-4a0f-adf2-f4911ba9ffa6";
        let uuid: ProximityUuid = text.parse().unwrap();
        assert_eq!(uuid.0[0], 0x2f);
        assert_eq!(uuid.0[15], 0xa6);
        assert_eq!(uuid.to_string(), text);

        let upper: ProximityUuid = text.to_uppercase().parse().unwrap();
        assert_eq!(upper, uuid);
    }

    #[test]
    fn test_uuid_rejects_garbage() {
        assert!("2f234454cf6d4a0fadf2f4911ba9ffa6".parse::<ProximityUuid>().is_err());
        assert!("2f234454-cf6d-4a0f-adf2-f4911ba9ffzz".parse::<ProximityUuid>().is_err());
        assert!("2f234454-cf6d-4a0f-adf2+f4911ba9ffa6".parse::<ProximityUuid>().is_err());
        assert!("2f234454-cf6d-4a0f-adf2-f4911ba9ff+a".parse::<ProximityUuid>().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TrackerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.expiration, Duration::from_secs(30));
        assert_eq!(config.payload_byte_count, 5);
        assert_eq!(config.proximity_uuid.to_string(), "2f234454-cf6d-4a0f-adf2-f4911ba9ffa6");
    }

    #[test]
    fn test_config_validation() {
        let config = TrackerConfig {
            expiration: Duration::from_secs(0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = TrackerConfig {
            payload_byte_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_json() {
        let config: TrackerConfig = serde_json::from_str(
            r#"{
                "proximity_uuid": "2f234454-cf6d-4a0f-adf2-f4911ba9ffa6",
                "expiration": 60.0,
                "payload_byte_count": 5,
                "channel_capacity": 16
            }"#,
        )
        .unwrap();
        assert_eq!(config.expiration, Duration::from_secs(60));
        assert_eq!(config.channel_capacity, 16);

        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains("\"2f234454-cf6d-4a0f-adf2-f4911ba9ffa6\""));
    }

    #[test]
    fn test_record_age_clamps_backwards_clock() {
        let now = SystemTime::now();
        let record = BeaconRecord {
            key: IdentityKey::new(1, 1),
            major: 1,
            minor: 1,
            tx_power: -59,
            rssi: -70,
            observed_at: now + Duration::from_secs(5),
            source: None,
        };
        assert_eq!(record.age(now), Duration::from_secs(0));
    }
}
