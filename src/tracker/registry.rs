use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tracing::trace;

use crate::core::{BeaconRecord, IdentityKey, IntakePath, Sighting};

/// Shared state behind every registry handle
struct Shared {
    /// Records older than this are swept on update
    expiration: Duration,
    /// Latest record per beacon
    beacons: Mutex<HashMap<IdentityKey, BeaconRecord>>,
}

/// Time-bounded map of nearby beacons.
///
/// Clones share the same map. Every operation takes one exclusive lock over
/// the whole map; stale records are only swept inside updates, so an idle
/// registry keeps them until the next sighting arrives.
#[derive(Clone)]
pub struct NearbyBeaconRegistry {
    shared: Arc<Shared>,
}

impl NearbyBeaconRegistry {
    /// Creates an empty registry
    pub fn new(expiration: Duration) -> Self {
        NearbyBeaconRegistry {
            shared: Arc::new(Shared {
                expiration,
                beacons: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn expiration(&self) -> Duration {
        self.shared.expiration
    }

    /// Records a sighting observed now
    pub fn update(&self, major: u16, minor: u16, tx_power: i16, rssi: i32) {
        self.update_at(major, minor, tx_power, rssi, SystemTime::now());
    }

    /// Records a sighting observed at `now` and sweeps stale records
    pub fn update_at(&self, major: u16, minor: u16, tx_power: i16, rssi: i32, now: SystemTime) {
        self.upsert(
            BeaconRecord {
                key: IdentityKey::new(major, minor),
                major,
                minor,
                tx_power,
                rssi,
                observed_at: now,
                source: None,
            },
            now,
        );
    }

    /// Records a sighting from an intake path
    pub fn record(&self, sighting: &Sighting) {
        self.record_at(sighting, SystemTime::now());
    }

    pub fn record_at(&self, sighting: &Sighting, now: SystemTime) {
        self.upsert(
            BeaconRecord {
                key: sighting.key(),
                major: sighting.major,
                minor: sighting.minor,
                tx_power: sighting.tx_power,
                rssi: sighting.rssi,
                observed_at: now,
                source: Some(sighting.source),
            },
            now,
        );
    }

    fn upsert(&self, record: BeaconRecord, now: SystemTime) {
        let expiration = self.shared.expiration;
        let mut beacons = self.shared.beacons.lock();

        beacons.insert(record.key, record);
        beacons.retain(|key, record| {
            let fresh = record.age(now) <= expiration;
            if !fresh {
                trace!(beacon = %key, "Evicting stale beacon");
            }
            fresh
        });
    }

    /// Point-in-time copy of all records, in no particular order
    pub fn snapshot(&self) -> Vec<BeaconRecord> {
        self.shared.beacons.lock().values().cloned().collect()
    }

    /// Latest record for `key`, if present
    pub fn get(&self, key: IdentityKey) -> Option<BeaconRecord> {
        self.shared.beacons.lock().get(&key).cloned()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.shared.beacons.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records per intake path
    pub fn count_by_source(&self, source: IntakePath) -> usize {
        self.shared
            .beacons
            .lock()
            .values()
            .filter(|record| record.source == Some(source))
            .count()
    }
}
