use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::{BeaconIdentity, Error, IntakePath, ProximityUuid, Result, Sighting};
use crate::protocol::{AdvertisementKind, AdvertisementReport, OverflowPayloadExtractor};

/// Creates a one-way channel of sightings from an intake path
pub fn intake_channel(capacity: usize) -> (SightingSender, SightingReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (SightingSender { tx }, SightingReceiver { rx })
}

/// Producer half of an intake channel
#[derive(Debug, Clone)]
pub struct SightingSender {
    tx: mpsc::Sender<Sighting>,
}

impl SightingSender {
    /// Sends a sighting from async code
    pub async fn send(&self, sighting: Sighting) -> Result<()> {
        self.tx.send(sighting).await
            .map_err(|e| Error::channel_closed(format!("Failed to send sighting: {}", e)))
    }

    /// Sends a sighting from a plain thread, such as a Bluetooth event loop.
    /// Must not be called from within an async runtime.
    pub fn blocking_send(&self, sighting: Sighting) -> Result<()> {
        self.tx.blocking_send(sighting)
            .map_err(|e| Error::channel_closed(format!("Failed to send sighting: {}", e)))
    }
}

/// Consumer half of an intake channel
#[derive(Debug)]
pub struct SightingReceiver {
    rx: mpsc::Receiver<Sighting>,
}

impl SightingReceiver {
    /// Next sighting; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<Sighting> {
        self.rx.recv().await
    }
}

/// Drops malformed advertisements; there is nothing to retry against.
fn screen(result: Result<Option<Sighting>>, report: &AdvertisementReport) -> Option<Sighting> {
    match result {
        Ok(sighting) => sighting,
        Err(e) => {
            warn!(address = %report.address, error = %e, "Dropping malformed advertisement");
            None
        }
    }
}

/// Direct iBeacon intake path
#[derive(Debug, Clone)]
pub struct IBeaconIntake {
    uuid: ProximityUuid,
    sender: SightingSender,
}

impl IBeaconIntake {
    /// Creates an intake accepting frames with the given proximity UUID
    pub fn new(uuid: ProximityUuid, sender: SightingSender) -> Self {
        IBeaconIntake { uuid, sender }
    }

    /// Sighting carried by `report`, if it is one of our iBeacons
    pub fn sighting(&self, report: &AdvertisementReport) -> Result<Option<Sighting>> {
        match report.classify()? {
            AdvertisementKind::IBeacon(frame) if frame.uuid == self.uuid => Ok(Some(
                Sighting::new(frame.identity(), report.rssi, IntakePath::IBeacon),
            )),
            _ => Ok(None),
        }
    }

    /// Forwards the sighting in `report`, if any. Returns whether one was sent.
    pub async fn handle(&self, report: &AdvertisementReport) -> Result<bool> {
        match screen(self.sighting(report), report) {
            Some(sighting) => {
                self.sender.send(sighting).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Blocking variant of [`handle`](Self::handle)
    pub fn handle_blocking(&self, report: &AdvertisementReport) -> Result<bool> {
        match screen(self.sighting(report), report) {
            Some(sighting) => {
                self.sender.blocking_send(sighting)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forwards a sighting the adapter already decoded
    pub async fn submit(&self, identity: BeaconIdentity, rssi: i32) -> Result<()> {
        self.sender
            .send(Sighting::new(identity, rssi, IntakePath::IBeacon))
            .await
    }
}

/// Overflow-area intake path
#[derive(Debug, Clone)]
pub struct OverflowIntake {
    extractor: OverflowPayloadExtractor,
    sender: SightingSender,
}

impl OverflowIntake {
    pub fn new(extractor: OverflowPayloadExtractor, sender: SightingSender) -> Self {
        OverflowIntake { extractor, sender }
    }

    /// Sighting decoded from the overflow area of `report`, if any
    pub fn sighting(&self, report: &AdvertisementReport) -> Result<Option<Sighting>> {
        let AdvertisementKind::OverflowArea(raw) = report.classify()? else {
            return Ok(None);
        };
        let identity = self.extractor.identify(&raw)?;
        if identity.is_none() {
            debug!(address = %report.address, "No beacon identity in overflow area");
        }
        Ok(identity.map(|identity| Sighting::new(identity, report.rssi, IntakePath::OverflowArea)))
    }

    /// Forwards the sighting in `report`, if any. Returns whether one was sent.
    pub async fn handle(&self, report: &AdvertisementReport) -> Result<bool> {
        match screen(self.sighting(report), report) {
            Some(sighting) => {
                self.sender.send(sighting).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Blocking variant of [`handle`](Self::handle)
    pub fn handle_blocking(&self, report: &AdvertisementReport) -> Result<bool> {
        match screen(self.sighting(report), report) {
            Some(sighting) => {
                self.sender.blocking_send(sighting)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::overflow::encode_payload;
    use crate::protocol::IBeaconFrame;

    fn uuid() -> ProximityUuid {
        "2f234454-cf6d-4a0f-adf2-f4911ba9ffa6".parse().unwrap()
    }

    fn overflow_report(payload: &[u8], rssi: i32) -> AdvertisementReport {
        let mut body = vec![0x01];
        body.extend(encode_payload(payload, 5).unwrap());
        AdvertisementReport::apple("C0:FF:EE:00:00:01", rssi, body)
    }

    #[tokio::test]
    async fn test_overflow_intake_forwards() {
        let (tx, mut rx) = intake_channel(8);
        let intake = OverflowIntake::new(OverflowPayloadExtractor::default(), tx);

        let sent = intake.handle(&overflow_report(&[0x00, 0x02, 0x1e, 0x61, 197], -70)).await.unwrap();
        assert!(sent);

        let sighting = rx.recv().await.unwrap();
        assert_eq!(sighting, Sighting {
            major: 2,
            minor: 7777,
            tx_power: -59,
            rssi: -70,
            source: IntakePath::OverflowArea,
        });
    }

    #[tokio::test]
    async fn test_overflow_intake_drops_bad_reports() {
        let (tx, _rx) = intake_channel(8);
        let intake = OverflowIntake::new(OverflowPayloadExtractor::default(), tx);

        // Too short for a codeword
        let short = AdvertisementReport::apple("AA", -70, vec![0x01, 0x00, 0x00]);
        assert!(matches!(intake.sighting(&short), Err(Error::MalformedInput { .. })));
        assert!(!intake.handle(&short).await.unwrap());

        // Not an overflow area at all
        let other = AdvertisementReport::apple("AA", -70, vec![0x07; 20]);
        assert!(!intake.handle(&other).await.unwrap());

        // All-zero body decodes but fails the sentinel
        let mut zeros = vec![0x01];
        zeros.extend([0u8; 16]);
        let foreign = AdvertisementReport::apple("AA", -70, zeros);
        assert_eq!(intake.sighting(&foreign).unwrap(), None);
    }

    #[tokio::test]
    async fn test_ibeacon_intake_filters_uuid() {
        let (tx, mut rx) = intake_channel(8);
        let intake = IBeaconIntake::new(uuid(), tx);

        let foreign = IBeaconFrame { uuid: ProximityUuid([0; 16]), major: 1, minor: 1, tx_power: -59 };
        let report = AdvertisementReport::apple("AA", -60, foreign.to_bytes());
        assert!(!intake.handle(&report).await.unwrap());

        let ours = IBeaconFrame { uuid: uuid(), major: 4, minor: 5, tx_power: -62 };
        let report = AdvertisementReport::apple("AA", -55, ours.to_bytes());
        assert!(intake.handle(&report).await.unwrap());

        let sighting = rx.recv().await.unwrap();
        assert_eq!(sighting.key(), crate::core::IdentityKey::new(4, 5));
        assert_eq!(sighting.tx_power, -62);
        assert_eq!(sighting.rssi, -55);
        assert_eq!(sighting.source, IntakePath::IBeacon);
    }

    #[tokio::test]
    async fn test_closed_channel() {
        let (tx, rx) = intake_channel(1);
        drop(rx);
        let intake = IBeaconIntake::new(uuid(), tx);
        let identity = BeaconIdentity { major: 1, minor: 2, tx_power: -59 };
        assert!(matches!(intake.submit(identity, -70).await, Err(Error::ChannelClosed(_))));
    }

    #[test]
    fn test_blocking_send_from_thread() {
        let (tx, mut rx) = intake_channel(4);
        let intake = OverflowIntake::new(OverflowPayloadExtractor::default(), tx);

        let report = overflow_report(&[0x00, 0x07, 0x00, 0x08, 200], -80);
        std::thread::spawn(move || intake.handle_blocking(&report).unwrap())
            .join()
            .unwrap();

        let sighting = tokio_test::block_on(rx.recv()).unwrap();
        assert_eq!(sighting.major, 7);
        assert_eq!(sighting.minor, 8);
        assert_eq!(sighting.tx_power, -56);
    }
}
