//! Telemetry polling service provider.

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use std::{sync::Arc, time::Duration};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::{
    app_context::AppState,
    event::{Event, EventBus},
    modes::keys,
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

const DEFAULT_POLL_SECONDS: i64 = 2;

/// Telemetry polling service provider.
///
/// Periodically reads the sensor counters, caches the snapshot in shared
/// state for the D-Bus `Sensors` property, and publishes `SensorsUpdated`
/// so the D-Bus service can broadcast it. Readings never influence the
/// dispatch path.
///
/// - **Priority**: 4
/// - **Critical**: No
pub struct TelemetryServiceProvider {
    state: Arc<AppState>,
    event_bus: EventBus,
}

impl TelemetryServiceProvider {
    pub fn new(state: Arc<AppState>, event_bus: EventBus) -> Self {
        Self { state, event_bus }
    }
}

#[async_trait]
impl ServiceProvider for TelemetryServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let state = self.state.clone();
        let event_bus = self.event_bus.clone();

        task_manager
            .spawn_task(self.name().to_string(), |cancel_token| async move {
                run_telemetry_service(state, event_bus, cancel_token).await
            })
            .await
    }

    fn name(&self) -> &'static str {
        "TelemetryService"
    }

    fn priority(&self) -> i32 {
        4
    }
}

async fn run_telemetry_service(
    state: Arc<AppState>,
    event_bus: EventBus,
    cancel_token: CancellationToken,
) -> Result<()> {
    let poll_seconds = state
        .settings
        .get_int_or(keys::SENSOR_POLL_SECONDS, DEFAULT_POLL_SECONDS)
        .await
        .max(1);
    let mut interval = interval(Duration::from_secs(poll_seconds as u64));

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Telemetry service cancelled");
                break;
            }
            _instant = interval.tick() => {
                let reading = state.counters.read_sensors();
                debug!("Sensor snapshot: {reading:?}");
                *state.last_reading.write().await = reading;

                if let Err(e) = event_bus.publish(Event::SensorsUpdated(reading)) {
                    warn!("Failed to publish sensor snapshot: {e}");
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        media::MockMediaSink,
        settings::{Settings, SettingsManager},
        telemetry::SensorCounters,
        transport::MockHardwareTransport,
    };
    use std::path::PathBuf;
    use tempfile::tempdir;
    use tokio::time::timeout;

    fn state_with_counters(counters: SensorCounters) -> Arc<AppState> {
        Arc::new(AppState::new(
            SettingsManager::new(Settings::default(), PathBuf::from("/dev/null")),
            Arc::new(MockHardwareTransport::new()),
            Arc::new(MockMediaSink::new()),
            counters,
        ))
    }

    #[tokio::test]
    async fn polls_counters_and_publishes_snapshots() {
        let dir = tempdir().unwrap();
        let thermal = dir.path().join("temp");
        let discharge = dir.path().join("power_now");
        std::fs::write(&thermal, "318\n").unwrap();
        std::fs::write(&discharge, "45000\n").unwrap();

        let state = state_with_counters(SensorCounters::new(thermal, discharge));
        let event_bus = EventBus::new();
        let mut receiver = event_bus.subscribe();
        let mut task_manager = TaskManager::new();

        let provider = TelemetryServiceProvider::new(state.clone(), event_bus);
        provider.start(&mut task_manager).await.unwrap();

        let event = timeout(Duration::from_secs(3), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            Event::SensorsUpdated(reading) => {
                assert_eq!(reading.cpu_temperature, Some(45.0));
                assert_eq!(reading.battery_discharge, Some(45.0));
            }
            other => panic!("Expected SensorsUpdated, got {other:?}"),
        }

        // The shared snapshot serves the D-Bus property.
        assert_eq!(
            state.last_reading.read().await.cpu_temperature,
            Some(45.0)
        );

        task_manager.shutdown_all().await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_counters_still_publish_empty_snapshots() {
        let dir = tempdir().unwrap();
        let state = state_with_counters(SensorCounters::new(
            dir.path().join("missing_temp"),
            dir.path().join("missing_power"),
        ));
        let event_bus = EventBus::new();
        let mut receiver = event_bus.subscribe();
        let mut task_manager = TaskManager::new();

        let provider = TelemetryServiceProvider::new(state, event_bus);
        provider.start(&mut task_manager).await.unwrap();

        let event = timeout(Duration::from_secs(3), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            Event::SensorsUpdated(reading) => {
                assert_eq!(reading.cpu_temperature, None);
                assert_eq!(reading.battery_discharge, None);
            }
            other => panic!("Expected SensorsUpdated, got {other:?}"),
        }

        task_manager.shutdown_all().await.unwrap();
    }
}
