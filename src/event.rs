//! Event-driven communication between daemon services.

use anyhow::Result;
use tokio::sync::broadcast;

use crate::{modes::ModeSetting, power::PowerState, telemetry::SensorReading, transport::EventCode};

/// Application events published through the [`EventBus`].
///
/// Hardware and power events feed the coordinator's serialized main loop;
/// `ModeChanged` and `VisibilityToggleRequested` are the hooks a settings
/// surface may subscribe to, so the core never depends on any GUI type.
#[derive(Debug, Clone)]
pub enum Event {
    /// Raw event code delivered by the hardware transport.
    HardwareEvent(EventCode),
    /// AC power source transition reported by the OS.
    PowerChanged(PowerState),
    /// A mode value was applied; presentation layers may refresh.
    ModeChanged { setting: ModeSetting, value: i64 },
    /// The user asked to show or hide the settings surface.
    VisibilityToggleRequested,
    /// Fresh sensor telemetry from the polling service.
    SensorsUpdated(SensorReading),
    /// The settings file was rewritten externally and reloaded.
    SettingsReloaded,
    SystemShutdown,
}

/// Event bus for publish-subscribe messaging between services.
///
/// A thin wrapper over a broadcast channel that lets services communicate
/// without direct dependencies.
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new EventBus with default capacity.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns an error if there are no active subscribers.
    pub fn publish(&self, event: Event) -> Result<()> {
        self.sender.send(event)?;
        Ok(())
    }

    /// Creates a new subscriber that receives all events published after
    /// subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
