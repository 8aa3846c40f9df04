//! Hotkey event dispatch.
//!
//! Maps raw firmware event codes to configured actions. The event taxonomy
//! is an explicit lookup table (code → class) and binding resolution is a
//! pure function of the class and its configured binding value, so the
//! whole mapping is testable without touching dispatch side effects.

use std::sync::Arc;

use log::{debug, trace, warn};

use crate::{
    event::{Event, EventBus},
    launcher::ProcessLauncher,
    media::MediaSink,
    modes::{AuraMode, ModeSetting, PerformanceMode, keys},
    settings::SettingsManager,
    transport::{EventCode, HardwareTransport},
};

/// Event classes the firmware is known to emit.
///
/// The plug/unplug codes are deliberate no-ops: the UPower notification
/// path drives auto modes, and reacting here as well would double-apply
/// on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// M3 hotkey (top row, left).
    M3,
    /// M4 / ROG hotkey.
    M4,
    /// Fn+F5, fixed performance cycle.
    FnF5,
    /// Fn+F4, fixed lighting cycle.
    FnF4,
    /// Firmware battery-unplug notification.
    BatteryUnplugged,
    /// Firmware AC-plug notification.
    AcPlugged,
}

/// The known firmware event codes.
pub mod codes {
    use crate::transport::EventCode;

    pub const M3: EventCode = 124;
    pub const M4: EventCode = 56;
    pub const FN_F5: EventCode = 174;
    pub const FN_F4: EventCode = 179;
    pub const BATTERY_UNPLUGGED: EventCode = 87;
    pub const AC_PLUGGED: EventCode = 88;
}

const EVENT_TABLE: &[(EventCode, EventClass)] = &[
    (codes::M3, EventClass::M3),
    (codes::M4, EventClass::M4),
    (codes::FN_F5, EventClass::FnF5),
    (codes::FN_F4, EventClass::FnF4),
    (codes::BATTERY_UNPLUGGED, EventClass::BatteryUnplugged),
    (codes::AC_PLUGGED, EventClass::AcPlugged),
];

/// Resolves an event code against the known-event table. Codes outside the
/// table belong to features this daemon does not model and are dropped by
/// the dispatcher.
pub fn classify(code: EventCode) -> Option<EventClass> {
    EVENT_TABLE
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, class)| *class)
}

/// The action a dispatch resolves to. Exactly one per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionBinding {
    ToggleMedia,
    CycleLighting,
    ToggleSettingsVisibility,
    CyclePerformance,
    LaunchCustom { command_key: &'static str },
    MuteMedia,
    NoOp,
}

impl EventClass {
    /// Settings key holding the configurable binding for this class, if
    /// the class is configurable at all.
    pub fn binding_key(self) -> Option<&'static str> {
        match self {
            Self::M3 => Some(keys::M3_BINDING),
            Self::M4 => Some(keys::M4_BINDING),
            _ => None,
        }
    }

    /// Pure binding resolution. `configured` is the stored binding value
    /// for this class, absent when the user never changed it; every
    /// unmapped value falls back to the class default.
    pub fn resolve(self, configured: Option<i64>) -> ActionBinding {
        match self {
            Self::M3 => match configured {
                Some(1) => ActionBinding::ToggleMedia,
                Some(2) => ActionBinding::CycleLighting,
                Some(3) => ActionBinding::LaunchCustom {
                    command_key: keys::M3_CUSTOM,
                },
                _ => ActionBinding::MuteMedia,
            },
            Self::M4 => match configured {
                Some(1) => ActionBinding::ToggleSettingsVisibility,
                Some(2) => ActionBinding::LaunchCustom {
                    command_key: keys::M4_CUSTOM,
                },
                _ => ActionBinding::CyclePerformance,
            },
            Self::FnF5 => ActionBinding::CyclePerformance,
            Self::FnF4 => ActionBinding::CycleLighting,
            Self::BatteryUnplugged | Self::AcPlugged => ActionBinding::NoOp,
        }
    }
}

/// Executes the configured action for each incoming event code.
///
/// All effects are side effects on the transport, the settings store, the
/// media sink or the process launcher; failures are absorbed and logged so
/// the event loop stays live. `dispatch` is only ever called from the
/// coordinator's single main loop, which is what serializes read-modify-
/// write access to the settings store.
pub struct ActionDispatcher {
    settings: SettingsManager,
    transport: Arc<dyn HardwareTransport>,
    media: Arc<dyn MediaSink>,
    launcher: ProcessLauncher,
    event_bus: EventBus,
}

impl ActionDispatcher {
    pub fn new(
        settings: SettingsManager,
        transport: Arc<dyn HardwareTransport>,
        media: Arc<dyn MediaSink>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            settings,
            transport,
            media,
            launcher: ProcessLauncher::new(),
            event_bus,
        }
    }

    /// Dispatches one event code: at most one binding read, exactly one
    /// resulting action. Unknown codes are silently dropped.
    pub async fn dispatch(&self, code: EventCode) {
        let Some(class) = classify(code) else {
            trace!("Ignoring unknown event code {code}");
            return;
        };

        let configured = match class.binding_key() {
            Some(key) => self.settings.get_int(key).await,
            None => None,
        };
        let binding = class.resolve(configured);
        debug!("Event {code} ({class:?}) resolved to {binding:?}");

        match binding {
            ActionBinding::ToggleMedia => {
                if let Err(e) = self.media.play_pause().await {
                    warn!("Media play/pause failed: {e}");
                }
            }
            ActionBinding::MuteMedia => {
                if let Err(e) = self.media.toggle_mute().await {
                    warn!("Media mute failed: {e}");
                }
            }
            ActionBinding::CycleLighting => self.cycle_aura().await,
            ActionBinding::CyclePerformance => self.cycle_performance().await,
            ActionBinding::ToggleSettingsVisibility => {
                // No subscriber just means no settings surface is attached.
                let _ = self.event_bus.publish(Event::VisibilityToggleRequested);
            }
            ActionBinding::LaunchCustom { command_key } => {
                let command = self.settings.get_str(command_key).await.unwrap_or_default();
                self.launcher.launch(&command);
            }
            ActionBinding::NoOp => {}
        }
    }

    async fn cycle_performance(&self) {
        let current = self.settings.get_int_or(keys::PERFORMANCE_MODE, 0).await;
        let next = PerformanceMode::from_raw(current).next();
        self.apply_cycled(ModeSetting::PerformanceMode, next.as_raw())
            .await;
    }

    async fn cycle_aura(&self) {
        let current = self.settings.get_int_or(keys::AURA_MODE, 0).await;
        let next = AuraMode::from_raw(current).next();
        self.apply_cycled(ModeSetting::AuraMode, next.as_raw()).await;
    }

    /// Persist-then-apply step shared by both cyclers: store the new value,
    /// push it to the hardware, notify any presentation subscriber.
    async fn apply_cycled(&self, setting: ModeSetting, value: i64) {
        self.settings.set_int(setting.value_key(), value).await;
        if let Err(e) = self.settings.save().await {
            warn!("Failed to persist {} value: {e}", setting.name());
        }

        if let Err(e) = self.transport.set_mode(setting, value).await {
            warn!("Transport failure applying {}: {e}", setting.name());
        }

        let _ = self.event_bus.publish(Event::ModeChanged { setting, value });
    }
}
