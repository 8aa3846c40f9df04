//! Auto-mode control on power-source transitions.
//!
//! Re-derives and applies the power-dependent modes whenever the power
//! source changes, and once at startup. Application is best-effort per
//! setting and idempotent: the derivation is a pure function of the power
//! state and the stored per-state targets, and the transport treats writes
//! of the current value as hardware no-ops.

use std::sync::Arc;

use log::{debug, warn};

use crate::{
    event::{Event, EventBus},
    modes::{ModeSetting, keys},
    power::PowerState,
    settings::SettingsManager,
    transport::HardwareTransport,
};

/// Default charge limit when the store has no value; 100 leaves charging
/// unrestricted, matching a factory-fresh machine.
const DEFAULT_CHARGE_LIMIT: i64 = 100;

/// Pure target derivation for a power-dependent mode.
pub fn derive_target(state: PowerState, plugged_value: i64, battery_value: i64) -> i64 {
    match state {
        PowerState::Plugged => plugged_value,
        PowerState::OnBattery => battery_value,
    }
}

/// Applies the configured auto modes for the current power state.
///
/// Never raises an error to its caller: a transport failure on one setting
/// is logged and the remaining settings are still attempted.
pub struct AutoModeController {
    settings: SettingsManager,
    transport: Arc<dyn HardwareTransport>,
    event_bus: EventBus,
}

/// The power-dependent settings and their per-state target keys.
const AUTO_SETTINGS: &[(ModeSetting, &str, &str)] = &[
    (ModeSetting::GpuMode, keys::GPU_PLUGGED, keys::GPU_BATTERY),
    (
        ModeSetting::ScreenMode,
        keys::SCREEN_PLUGGED,
        keys::SCREEN_BATTERY,
    ),
    (
        ModeSetting::PerformanceMode,
        keys::PERFORMANCE_PLUGGED,
        keys::PERFORMANCE_BATTERY,
    ),
];

impl AutoModeController {
    pub fn new(
        settings: SettingsManager,
        transport: Arc<dyn HardwareTransport>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            settings,
            transport,
            event_bus,
        }
    }

    /// Applies every auto-flagged mode for `state`, then the charge limit
    /// unconditionally.
    pub async fn apply_auto_modes(&self, state: PowerState) {
        debug!("Applying auto modes for {state:?}");

        for &(setting, plugged_key, battery_key) in AUTO_SETTINGS {
            let auto_key = match setting.auto_key() {
                Some(key) => key,
                None => continue,
            };
            if self.settings.get_int_or(auto_key, 0).await == 0 {
                continue;
            }

            let plugged_value = self.settings.get_int_or(plugged_key, 0).await;
            let battery_value = self.settings.get_int_or(battery_key, 0).await;
            let target = derive_target(state, plugged_value, battery_value);

            self.apply(setting, target).await;
        }

        // Charge limit is not power-state-dependent; one stored value,
        // reapplied on every invocation.
        let limit = self
            .settings
            .get_int_or(keys::CHARGE_LIMIT, DEFAULT_CHARGE_LIMIT)
            .await;
        self.apply(ModeSetting::ChargeLimit, limit).await;
    }

    async fn apply(&self, setting: ModeSetting, value: i64) {
        match self.transport.set_mode(setting, value).await {
            Ok(()) => {
                let _ = self.event_bus.publish(Event::ModeChanged { setting, value });
            }
            Err(e) => {
                // Leave the mode unchanged; the next transition retries.
                warn!("Transport failure applying {}: {e}", setting.name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        modes::GpuMode,
        settings::{Settings, SettingsManager},
        transport::MockHardwareTransport,
    };
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn settings_with(values: &[(&str, i64)]) -> SettingsManager {
        let mut settings = Settings::default();
        for (key, value) in values {
            settings.set_int(key, *value);
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yml");
        std::mem::forget(dir);
        SettingsManager::new(settings, path)
    }

    fn controller(
        settings: SettingsManager,
        transport: MockHardwareTransport,
    ) -> AutoModeController {
        AutoModeController::new(settings, Arc::new(transport), EventBus::new())
    }

    #[test]
    fn derivation_is_pure_and_state_selected() {
        assert_eq!(derive_target(PowerState::Plugged, 2, 0), 2);
        assert_eq!(derive_target(PowerState::OnBattery, 2, 0), 0);
    }

    #[tokio::test]
    async fn battery_transition_applies_battery_gpu_target_once() {
        let settings = settings_with(&[
            (keys::GPU_AUTO, 1),
            (keys::GPU_PLUGGED, GpuMode::Ultimate.as_raw()),
            (keys::GPU_BATTERY, GpuMode::Eco.as_raw()),
        ]);

        let mut transport = MockHardwareTransport::new();
        transport
            .expect_set_mode()
            .with(eq(ModeSetting::GpuMode), eq(GpuMode::Eco.as_raw()))
            .times(1)
            .returning(|_, _| Ok(()));
        transport
            .expect_set_mode()
            .with(eq(ModeSetting::ChargeLimit), eq(100))
            .times(1)
            .returning(|_, _| Ok(()));

        controller(settings, transport)
            .apply_auto_modes(PowerState::OnBattery)
            .await;
    }

    #[tokio::test]
    async fn repeated_application_computes_identical_targets() {
        let settings = settings_with(&[
            (keys::PERFORMANCE_AUTO, 1),
            (keys::PERFORMANCE_PLUGGED, 1),
            (keys::PERFORMANCE_BATTERY, 2),
            (keys::CHARGE_LIMIT, 80),
        ]);

        let mut transport = MockHardwareTransport::new();
        // Two invocations, same power state: the same targets both times.
        transport
            .expect_set_mode()
            .with(eq(ModeSetting::PerformanceMode), eq(1))
            .times(2)
            .returning(|_, _| Ok(()));
        transport
            .expect_set_mode()
            .with(eq(ModeSetting::ChargeLimit), eq(80))
            .times(2)
            .returning(|_, _| Ok(()));

        let controller = controller(settings, transport);
        controller.apply_auto_modes(PowerState::Plugged).await;
        controller.apply_auto_modes(PowerState::Plugged).await;
    }

    #[tokio::test]
    async fn disabled_auto_flags_skip_everything_but_charge_limit() {
        let settings = settings_with(&[
            (keys::GPU_AUTO, 0),
            (keys::SCREEN_AUTO, 0),
            (keys::CHARGE_LIMIT, 60),
        ]);

        let mut transport = MockHardwareTransport::new();
        transport
            .expect_set_mode()
            .with(eq(ModeSetting::ChargeLimit), eq(60))
            .times(1)
            .returning(|_, _| Ok(()));

        controller(settings, transport)
            .apply_auto_modes(PowerState::Plugged)
            .await;
    }

    #[tokio::test]
    async fn one_transport_failure_does_not_block_the_rest() {
        let settings = settings_with(&[
            (keys::GPU_AUTO, 1),
            (keys::SCREEN_AUTO, 1),
            (keys::SCREEN_PLUGGED, 1),
            (keys::CHARGE_LIMIT, 80),
        ]);

        let mut transport = MockHardwareTransport::new();
        transport
            .expect_set_mode()
            .with(eq(ModeSetting::GpuMode), eq(0))
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("transport failure")));
        transport
            .expect_set_mode()
            .with(eq(ModeSetting::ScreenMode), eq(1))
            .times(1)
            .returning(|_, _| Ok(()));
        transport
            .expect_set_mode()
            .with(eq(ModeSetting::ChargeLimit), eq(80))
            .times(1)
            .returning(|_, _| Ok(()));

        controller(settings, transport)
            .apply_auto_modes(PowerState::Plugged)
            .await;
    }

    #[tokio::test]
    async fn successful_apply_publishes_mode_changed() {
        let settings = settings_with(&[(keys::CHARGE_LIMIT, 80)]);

        let mut transport = MockHardwareTransport::new();
        transport.expect_set_mode().returning(|_, _| Ok(()));

        let event_bus = EventBus::new();
        let mut receiver = event_bus.subscribe();
        let controller = AutoModeController::new(settings, Arc::new(transport), event_bus);

        controller.apply_auto_modes(PowerState::Plugged).await;

        match receiver.recv().await.unwrap() {
            Event::ModeChanged { setting, value } => {
                assert_eq!(setting, ModeSetting::ChargeLimit);
                assert_eq!(value, 80);
            }
            other => panic!("Expected ModeChanged, got {other:?}"),
        }
    }
}
