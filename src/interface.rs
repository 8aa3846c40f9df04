//! D-Bus interface for the external settings surface.
//!
//! The GUI never links against the daemon; it observes mode changes and
//! sensor telemetry through signals here and triggers cycles through the
//! same serialized dispatch path as the physical hotkeys.

use std::sync::Arc;

use zbus::{interface, object_server::SignalEmitter};

use crate::{
    app_context::AppState,
    dispatcher::codes,
    event::{Event, EventBus},
    modes::keys,
};

/// Sentinel reported over D-Bus when a sensor counter is unavailable.
const SENSOR_UNAVAILABLE: f64 = -1.0;

pub struct DBusInterface {
    state: Arc<AppState>,
    event_bus: EventBus,
    version: String,
}

impl DBusInterface {
    pub fn new(state: Arc<AppState>, version: String, event_bus: EventBus) -> Self {
        Self {
            state,
            event_bus,
            version,
        }
    }
}

#[interface(name = "io.github.armouryd1")]
impl DBusInterface {
    /// A mode value was applied, either by a hotkey cycle or by the
    /// auto-mode controller.
    #[zbus(signal)]
    pub async fn mode_changed(
        emitter: &SignalEmitter<'_>,
        setting: String,
        value: i64,
    ) -> zbus::Result<()>;

    /// The user pressed the hotkey bound to settings visibility.
    #[zbus(signal)]
    pub async fn visibility_toggle_requested(emitter: &SignalEmitter<'_>) -> zbus::Result<()>;

    /// Fresh sensor telemetry; unavailable counters report -1.
    #[zbus(signal)]
    pub async fn sensors_updated(
        emitter: &SignalEmitter<'_>,
        cpu_temperature: f64,
        battery_discharge: f64,
    ) -> zbus::Result<()>;

    /// Cycles the performance profile through the same path as Fn+F5.
    async fn cycle_performance(&self) {
        let _ = self.event_bus.publish(Event::HardwareEvent(codes::FN_F5));
    }

    /// Cycles the lighting mode through the same path as Fn+F4.
    async fn cycle_aura(&self) {
        let _ = self.event_bus.publish(Event::HardwareEvent(codes::FN_F4));
    }

    async fn stop(&self) {
        let _ = self.event_bus.publish(Event::SystemShutdown);
    }

    #[zbus(property)]
    async fn version(&self) -> String {
        self.version.clone()
    }

    #[zbus(property)]
    async fn performance_mode(&self) -> i64 {
        self.state.settings.get_int_or(keys::PERFORMANCE_MODE, 0).await
    }

    #[zbus(property)]
    async fn aura_mode(&self) -> i64 {
        self.state.settings.get_int_or(keys::AURA_MODE, 0).await
    }

    #[zbus(property)]
    async fn charge_limit(&self) -> i64 {
        self.state.settings.get_int_or(keys::CHARGE_LIMIT, 100).await
    }

    #[zbus(property)]
    async fn sensors(&self) -> (f64, f64) {
        let reading = *self.state.last_reading.read().await;
        (
            reading
                .cpu_temperature
                .map_or(SENSOR_UNAVAILABLE, f64::from),
            reading
                .battery_discharge
                .map_or(SENSOR_UNAVAILABLE, f64::from),
        )
    }
}
