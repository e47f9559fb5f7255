use std::collections::HashMap;

use bytes::Bytes;

use crate::core::{Result, APPLE_COMPANY_ID};
use super::ibeacon::IBeaconFrame;

/// Leading byte of an Apple body that carries an overflow area
pub const OVERFLOW_MARKER: u8 = 0x01;

/// Advertisement report delivered by the Bluetooth adapter
#[derive(Debug, Clone, Default)]
pub struct AdvertisementReport {
    /// Device address, opaque to this crate
    pub address: String,
    /// Received signal strength in dBm
    pub rssi: i32,
    /// Manufacturer data keyed by company identifier
    pub manufacturer_data: HashMap<u16, Bytes>,
}

impl AdvertisementReport {
    /// Creates a report carrying a single Apple manufacturer-data body
    pub fn apple(address: impl Into<String>, rssi: i32, body: impl Into<Bytes>) -> Self {
        let mut manufacturer_data = HashMap::new();
        manufacturer_data.insert(APPLE_COMPANY_ID, body.into());
        AdvertisementReport {
            address: address.into(),
            rssi,
            manufacturer_data,
        }
    }

    /// Classifies the Apple body of this report
    pub fn classify(&self) -> Result<AdvertisementKind> {
        classify(self)
    }
}

/// What an advertisement carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvertisementKind {
    /// A primary iBeacon frame
    IBeacon(IBeaconFrame),
    /// An overflow area, marker byte stripped
    OverflowArea(Bytes),
    /// Anything else
    Other,
}

/// Routes a report to the iBeacon or overflow-area path.
pub fn classify(report: &AdvertisementReport) -> Result<AdvertisementKind> {
    let Some(body) = report.manufacturer_data.get(&APPLE_COMPANY_ID) else {
        return Ok(AdvertisementKind::Other);
    };

    if let Some(frame) = IBeaconFrame::parse(body)? {
        return Ok(AdvertisementKind::IBeacon(frame));
    }

    match body.first() {
        Some(&OVERFLOW_MARKER) => Ok(AdvertisementKind::OverflowArea(body.slice(1..))),
        _ => Ok(AdvertisementKind::Other),
    }
}
