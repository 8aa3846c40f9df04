//! Shared application state.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    media::MediaSink,
    settings::SettingsManager,
    telemetry::{SensorCounters, SensorReading},
    transport::HardwareTransport,
};

/// Runtime state shared by all services.
///
/// Collaborators are held behind their trait seams and injected at
/// construction; the daemon has no ambient statics.
pub struct AppState {
    /// Flat settings store shared with the external settings surface.
    pub settings: SettingsManager,
    /// Hardware transport for mode get/set and the event stream.
    pub transport: Arc<dyn HardwareTransport>,
    /// Media sink for the hotkey media actions.
    pub media: Arc<dyn MediaSink>,
    /// Telemetry counter locations.
    pub counters: SensorCounters,
    /// Last telemetry snapshot, refreshed by the polling service and
    /// served over D-Bus.
    pub last_reading: Arc<RwLock<SensorReading>>,
}

impl AppState {
    pub fn new(
        settings: SettingsManager,
        transport: Arc<dyn HardwareTransport>,
        media: Arc<dyn MediaSink>,
        counters: SensorCounters,
    ) -> Self {
        Self {
            settings,
            transport,
            media,
            counters,
            last_reading: Arc::new(RwLock::new(SensorReading::default())),
        }
    }
}
