//! AC power source state and the UPower notification proxy.

use zbus::proxy;

/// Current power source. Sourced from the OS at runtime, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    OnBattery,
    Plugged,
}

impl PowerState {
    pub fn from_on_battery(on_battery: bool) -> Self {
        if on_battery {
            Self::OnBattery
        } else {
            Self::Plugged
        }
    }

    pub fn is_plugged(self) -> bool {
        matches!(self, Self::Plugged)
    }
}

/// UPower system service proxy; the `OnBattery` property change stream is
/// the OS power-notification callback of the core.
#[proxy(
    interface = "org.freedesktop.UPower",
    default_service = "org.freedesktop.UPower",
    default_path = "/org/freedesktop/UPower",
    gen_blocking = false
)]
pub trait UPower {
    #[zbus(property)]
    fn on_battery(&self) -> zbus::Result<bool>;
}
