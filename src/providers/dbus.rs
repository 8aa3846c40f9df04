//! D-Bus service provider for dependency injection.

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use zbus::Connection;

use crate::{
    app_context::AppState,
    event::{Event, EventBus},
    interface::{DBusInterface, DBusInterfaceSignals},
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

const OBJECT_PATH: &str = "/io/github/armouryd";
const SERVICE_NAME: &str = "io.github.armouryd";

/// D-Bus service provider for the external settings surface.
///
/// Registers the daemon interface on the session bus and forwards bus
/// events to D-Bus signals, so a GUI can mirror mode changes, visibility
/// requests and telemetry without linking against the daemon.
///
/// - **Priority**: 8
/// - **Critical**: Yes
///
/// Requires a running D-Bus session bus; creation fails without one, which
/// the coordinator surfaces at startup.
pub struct DBusServiceProvider {
    state: Arc<AppState>,
    event_bus: EventBus,
    connection: Connection,
}

impl DBusServiceProvider {
    /// Creates a new D-Bus service provider with session bus connection.
    pub async fn new(state: Arc<AppState>, event_bus: EventBus) -> Result<Self> {
        let connection = Connection::session().await?;
        Ok(Self {
            state,
            event_bus,
            connection,
        })
    }
}

#[async_trait]
impl ServiceProvider for DBusServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let state = self.state.clone();
        let event_bus = self.event_bus.clone();
        let connection = self.connection.clone();

        task_manager
            .spawn_task(self.name().to_string(), |cancel_token| async move {
                run_dbus_service(state, event_bus, connection, cancel_token).await
            })
            .await
    }

    fn name(&self) -> &'static str {
        "DBusService"
    }

    fn priority(&self) -> i32 {
        8
    }

    fn is_critical(&self) -> bool {
        true
    }
}

async fn run_dbus_service(
    state: Arc<AppState>,
    event_bus: EventBus,
    connection: Connection,
    cancel_token: CancellationToken,
) -> Result<()> {
    let interface = DBusInterface::new(
        state,
        env!("CARGO_PKG_VERSION").to_string(),
        event_bus.clone(),
    );
    connection.object_server().at(OBJECT_PATH, interface).await?;
    connection.request_name(SERVICE_NAME).await?;

    let iface_ref = connection
        .object_server()
        .interface::<_, DBusInterface>(OBJECT_PATH)
        .await?;

    let mut events = event_bus.subscribe();

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("D-Bus service cancelled");
                break;
            }
            event = events.recv() => {
                let Ok(event) = event else {
                    warn!("Event bus closed, stopping D-Bus service");
                    break;
                };
                let emitted = match event {
                    Event::ModeChanged { setting, value } => {
                        iface_ref
                            .mode_changed(setting.name().to_string(), value)
                            .await
                    }
                    Event::VisibilityToggleRequested => {
                        iface_ref.visibility_toggle_requested().await
                    }
                    Event::SensorsUpdated(reading) => {
                        iface_ref
                            .sensors_updated(
                                reading.cpu_temperature.map_or(-1.0, f64::from),
                                reading.battery_discharge.map_or(-1.0, f64::from),
                            )
                            .await
                    }
                    _ => Ok(()),
                };
                if let Err(e) = emitted {
                    warn!("Failed to emit D-Bus signal: {e}");
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

    fn mock_app_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            SettingsManager::new(Settings::default(), PathBuf::from("/dev/null")),
            Arc::new(MockHardwareTransport::new()),
            Arc::new(MockMediaSink::new()),
            SensorCounters::system_defaults(),
        ))
    }

    #[tokio::test]
    async fn provider_metadata_when_session_bus_is_available() {
        // Session bus is absent on most CI machines; only assert when the
        // connection succeeds.
        if let Ok(provider) = DBusServiceProvider::new(mock_app_state(), EventBus::new()).await {
            assert_eq!(provider.name(), "DBusService");
            assert_eq!(provider.priority(), 8);
            assert!(provider.is_critical());
        }
    }

    #[tokio::test]
    async fn creation_without_session_bus_fails_gracefully() {
        match DBusServiceProvider::new(mock_app_state(), EventBus::new()).await {
            Ok(_) => {}
            Err(e) => assert!(!e.to_string().is_empty()),
        }
    }
}
