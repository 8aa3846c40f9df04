//! Dependency injection providers for service management.
//!
//! Each daemon service is created through a provider so the coordinator
//! can start them in priority order and degrade gracefully when optional
//! ones are unavailable.

pub mod app_state;
pub mod dbus;
pub mod hotkey;
pub mod power;
pub mod settings_watcher;
pub mod telemetry;
pub mod traits;

// Re-export core types for convenience
pub use app_state::AppStateProvider;
pub use dbus::DBusServiceProvider;
pub use hotkey::HotkeyServiceProvider;
pub use power::PowerServiceProvider;
pub use settings_watcher::SettingsWatcherServiceProvider;
pub use telemetry::TelemetryServiceProvider;
pub use traits::{AsyncProvider, ServiceProvider};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::{
        app_context::AppState,
        event::EventBus,
        media::MockMediaSink,
        settings::{Settings, SettingsManager},
        telemetry::SensorCounters,
        transport::MockHardwareTransport,
    };
    use std::{path::PathBuf, sync::Arc};

    fn create_test_app_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            SettingsManager::new(Settings::default(), PathBuf::from("/tmp/test-settings.yml")),
            Arc::new(MockHardwareTransport::new()),
            Arc::new(MockMediaSink::new()),
            SensorCounters::system_defaults(),
        ))
    }

    #[tokio::test]
    async fn service_providers_share_state_and_report_metadata() {
        let state = create_test_app_state();
        let event_bus = EventBus::new();

        let hotkey = HotkeyServiceProvider::new(state.clone(), event_bus.clone());
        let watcher = SettingsWatcherServiceProvider::new(state.clone(), event_bus.clone());
        let telemetry = TelemetryServiceProvider::new(state.clone(), event_bus.clone());

        assert_eq!(hotkey.name(), "HotkeyService");
        assert_eq!(watcher.name(), "SettingsWatcherService");
        assert_eq!(telemetry.name(), "TelemetryService");

        // Hotkey dispatch outranks everything else.
        assert!(hotkey.priority() > watcher.priority());
        assert!(watcher.priority() > telemetry.priority());

        assert!(hotkey.is_critical());
        assert!(!watcher.is_critical());
        assert!(!telemetry.is_critical());
    }

    #[tokio::test]
    async fn providers_sorted_by_priority_start_hotkeys_first() {
        let state = create_test_app_state();
        let event_bus = EventBus::new();

        let mut providers: Vec<Box<dyn ServiceProvider>> = vec![
            Box::new(TelemetryServiceProvider::new(
                state.clone(),
                event_bus.clone(),
            )),
            Box::new(HotkeyServiceProvider::new(state.clone(), event_bus.clone())),
            Box::new(SettingsWatcherServiceProvider::new(
                state.clone(),
                event_bus.clone(),
            )),
        ];
        providers.sort_by_key(|p| std::cmp::Reverse(p.priority()));

        let order: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(
            order,
            vec!["HotkeyService", "SettingsWatcherService", "TelemetryService"]
        );
    }
}
