//! Nearby beacon tracking
//!
//! Two intake paths (direct iBeacon frames and overflow-area payloads) each
//! own a one-way channel of sightings. The tracker pumps both channels into
//! one [`NearbyBeaconRegistry`] and hands every sighting to an optional
//! consumer callback. Neither the registry nor the tracker refers back to the
//! producers.

mod intake;
mod registry;

pub use self::intake::{
    intake_channel, IBeaconIntake, OverflowIntake, SightingReceiver, SightingSender,
};
pub use self::registry::NearbyBeaconRegistry;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::{BeaconRecord, Error, IntakePath, Result, Sighting, TrackerConfig};
use crate::protocol::OverflowPayloadExtractor;

/// Consumer callback invoked after each sighting is recorded
pub type SightingCallback = Arc<dyn Fn(&Sighting) + Send + Sync>;

/// Producer handles returned by [`BeaconTracker::start`]
#[derive(Debug, Clone)]
pub struct Intakes {
    pub ibeacon: IBeaconIntake,
    pub overflow: OverflowIntake,
}

/// Owns the registry and the tasks feeding it
pub struct BeaconTracker {
    /// Configuration
    config: TrackerConfig,
    /// Shared registry
    registry: NearbyBeaconRegistry,
    /// Consumer callback
    callback: Option<SightingCallback>,
    /// Stops the pump tasks
    cancel: CancellationToken,
    /// Running pump tasks
    tasks: Vec<JoinHandle<()>>,
}

impl BeaconTracker {
    /// Creates a tracker with an empty registry
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        let registry = NearbyBeaconRegistry::new(config.expiration);
        Ok(BeaconTracker {
            config,
            registry,
            callback: None,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    /// Sets the consumer callback
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Sighting) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Handle to the shared registry
    pub fn registry(&self) -> NearbyBeaconRegistry {
        self.registry.clone()
    }

    /// Nearby beacons right now
    pub fn nearby(&self) -> Vec<BeaconRecord> {
        self.registry.snapshot()
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Spawns one pump task per intake path and returns their producer
    /// handles. Must be called within a Tokio runtime.
    pub fn start(&mut self) -> Result<Intakes> {
        if self.is_running() {
            return Err(Error::task("Tracker already started"));
        }
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }

        let (ibeacon_tx, ibeacon_rx) = intake_channel(self.config.channel_capacity);
        let (overflow_tx, overflow_rx) = intake_channel(self.config.channel_capacity);

        for (path, rx) in [
            (IntakePath::IBeacon, ibeacon_rx),
            (IntakePath::OverflowArea, overflow_rx),
        ] {
            self.tasks.push(tokio::spawn(pump(
                path,
                rx,
                self.registry.clone(),
                self.callback.clone(),
                self.cancel.clone(),
            )));
        }

        info!(
            uuid = %self.config.proximity_uuid,
            expiration_secs = self.config.expiration.as_secs_f64(),
            "Beacon tracker started"
        );

        Ok(Intakes {
            ibeacon: IBeaconIntake::new(self.config.proximity_uuid, ibeacon_tx),
            overflow: OverflowIntake::new(
                OverflowPayloadExtractor::new(self.config.payload_byte_count),
                overflow_tx,
            ),
        })
    }

    /// Stops the pump tasks once their queued sightings are recorded
    pub async fn shutdown(&mut self) -> Result<()> {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            task.await
                .map_err(|e| Error::task(format!("Intake task failed: {}", e)))?;
        }
        info!("Beacon tracker stopped");
        Ok(())
    }
}

impl Drop for BeaconTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Moves sightings from one intake channel into the registry
async fn pump(
    path: IntakePath,
    mut rx: SightingReceiver,
    registry: NearbyBeaconRegistry,
    callback: Option<SightingCallback>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            next = rx.recv() => match next {
                Some(sighting) => {
                    registry.record(&sighting);
                    if let Some(callback) = &callback {
                        callback(&sighting);
                    }
                }
                None => break,
            },
            _ = cancel.cancelled() => break,
        }
    }
    debug!(?path, "Intake pump stopped");
}
