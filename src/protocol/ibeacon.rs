//! iBeacon manufacturer-data frame.
//!
//! Body following the Apple company identifier:
//!
//! ```text
//! | 0x02 | 0x15 | proximity UUID (16) | major (BE u16) | minor (BE u16) | tx power (i8) |
//! ```

use crate::core::{BeaconIdentity, Error, ProximityUuid, Result};

/// iBeacon type and length prefix
pub const IBEACON_PREFIX: [u8; 2] = [0x02, 0x15];

/// Frame length including the prefix
pub const IBEACON_FRAME_LEN: usize = 23;

/// Decoded iBeacon advertisement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IBeaconFrame {
    pub uuid: ProximityUuid,
    pub major: u16,
    pub minor: u16,
    /// Calibrated RSSI at one meter, in dBm
    pub tx_power: i8,
}

impl IBeaconFrame {
    /// Parses an Apple manufacturer-data body.
    ///
    /// Returns `Ok(None)` when the body is not an iBeacon frame.
    pub fn parse(data: &[u8]) -> Result<Option<Self>> {
        if !data.starts_with(&IBEACON_PREFIX) {
            return Ok(None);
        }
        if data.len() < IBEACON_FRAME_LEN {
            return Err(Error::malformed(IBEACON_FRAME_LEN, data.len()));
        }

        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&data[2..18]);
        Ok(Some(IBeaconFrame {
            uuid: ProximityUuid(uuid),
            major: u16::from_be_bytes([data[18], data[19]]),
            minor: u16::from_be_bytes([data[20], data[21]]),
            tx_power: data[22] as i8,
        }))
    }

    /// Serializes the frame as a manufacturer-data body
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(IBEACON_FRAME_LEN);
        data.extend_from_slice(&IBEACON_PREFIX);
        data.extend_from_slice(self.uuid.as_bytes());
        data.extend_from_slice(&self.major.to_be_bytes());
        data.extend_from_slice(&self.minor.to_be_bytes());
        data.push(self.tx_power as u8);
        data
    }

    pub fn identity(&self) -> BeaconIdentity {
        BeaconIdentity {
            major: self.major,
            minor: self.minor,
            tx_power: self.tx_power as i16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> IBeaconFrame {
        IBeaconFrame {
            uuid: "2f234454-cf6d-4a0f-adf2-f4911ba9ffa6".parse().unwrap(),
            major: 2,
            minor: 7777,
            tx_power: -59,
        }
    }

    #[test]
    fn test_frame_layout() {
        let bytes = frame().to_bytes();
        assert_eq!(bytes.len(), IBEACON_FRAME_LEN);
        assert_eq!(&bytes[..4], &[0x02, 0x15, 0x2f, 0x23]);
        assert_eq!(&bytes[18..], &[0x00, 0x02, 0x1e, 0x61, 0xc5]);
    }

    #[test]
    fn test_parse() {
        let parsed = IBeaconFrame::parse(&frame().to_bytes()).unwrap().unwrap();
        assert_eq!(parsed, frame());
        assert_eq!(parsed.identity(), BeaconIdentity { major: 2, minor: 7777, tx_power: -59 });
    }

    #[test]
    fn test_parse_other_and_truncated() {
        assert_eq!(IBeaconFrame::parse(&[0x01, 0x00, 0x00]).unwrap(), None);
        assert_eq!(IBeaconFrame::parse(&[]).unwrap(), None);

        let bytes = frame().to_bytes();
        let result = IBeaconFrame::parse(&bytes[..20]);
        assert!(matches!(result, Err(Error::MalformedInput { needed: 23, actual: 20 })));
    }
}
