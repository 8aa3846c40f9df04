//! Hardware mode settings and their cycle transitions.
//!
//! Every mode the daemon controls is identified by a [`ModeSetting`] and
//! stored in the settings file as a plain integer. The cycle transitions
//! are pure functions over fixed total cycles so that dispatch logic can
//! be tested without hardware or storage collaborators.

/// Settings keys used by the core.
pub mod keys {
    pub const PERFORMANCE_MODE: &str = "performance_mode";
    pub const AURA_MODE: &str = "aura_mode";
    pub const GPU_MODE: &str = "gpu_mode";
    pub const SCREEN_MODE: &str = "screen_mode";
    pub const CHARGE_LIMIT: &str = "charge_limit";

    pub const GPU_AUTO: &str = "gpu_auto";
    pub const SCREEN_AUTO: &str = "screen_auto";
    pub const PERFORMANCE_AUTO: &str = "performance_auto";

    pub const GPU_PLUGGED: &str = "gpu_plugged";
    pub const GPU_BATTERY: &str = "gpu_battery";
    pub const SCREEN_PLUGGED: &str = "screen_plugged";
    pub const SCREEN_BATTERY: &str = "screen_battery";
    pub const PERFORMANCE_PLUGGED: &str = "performance_plugged";
    pub const PERFORMANCE_BATTERY: &str = "performance_battery";

    pub const M3_BINDING: &str = "m3";
    pub const M4_BINDING: &str = "m4";
    pub const M3_CUSTOM: &str = "m3_custom";
    pub const M4_CUSTOM: &str = "m4_custom";

    pub const SENSOR_POLL_SECONDS: &str = "sensor_poll_seconds";
}

/// A hardware-controllable operating mode with a persisted target value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeSetting {
    GpuMode,
    ScreenMode,
    PerformanceMode,
    AuraMode,
    ChargeLimit,
}

impl ModeSetting {
    /// Settings key holding the current value of this mode.
    pub fn value_key(self) -> &'static str {
        match self {
            Self::GpuMode => keys::GPU_MODE,
            Self::ScreenMode => keys::SCREEN_MODE,
            Self::PerformanceMode => keys::PERFORMANCE_MODE,
            Self::AuraMode => keys::AURA_MODE,
            Self::ChargeLimit => keys::CHARGE_LIMIT,
        }
    }

    /// Key of the auto-switch flag, for modes that re-derive on power
    /// transitions. `None` for modes without an auto policy.
    pub fn auto_key(self) -> Option<&'static str> {
        match self {
            Self::GpuMode => Some(keys::GPU_AUTO),
            Self::ScreenMode => Some(keys::SCREEN_AUTO),
            Self::PerformanceMode => Some(keys::PERFORMANCE_AUTO),
            Self::AuraMode | Self::ChargeLimit => None,
        }
    }

    /// Stable name used in D-Bus signals and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::GpuMode => "gpu",
            Self::ScreenMode => "screen",
            Self::PerformanceMode => "performance",
            Self::AuraMode => "aura",
            Self::ChargeLimit => "charge_limit",
        }
    }
}

/// Performance profile, cycled by Fn+F5 and the M4 default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceMode {
    Balanced,
    Turbo,
    Silent,
}

impl PerformanceMode {
    pub const CYCLE: [Self; 3] = [Self::Balanced, Self::Turbo, Self::Silent];

    /// Maps a stored integer back to a profile. Out-of-range values fall
    /// back to `Balanced` so a corrupted settings file cannot wedge cycling.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Self::Turbo,
            2 => Self::Silent,
            _ => Self::Balanced,
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            Self::Balanced => 0,
            Self::Turbo => 1,
            Self::Silent => 2,
        }
    }

    /// Next profile in the fixed cycle, wrapping from the last to the first.
    pub fn next(self) -> Self {
        cycle_next(&Self::CYCLE, self)
    }
}

/// Keyboard lighting mode, cycled by Fn+F4 and the M3 binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuraMode {
    Static,
    Breathe,
    ColorCycle,
    Rainbow,
}

impl AuraMode {
    pub const CYCLE: [Self; 4] = [Self::Static, Self::Breathe, Self::ColorCycle, Self::Rainbow];

    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => Self::Breathe,
            2 => Self::ColorCycle,
            3 => Self::Rainbow,
            _ => Self::Static,
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            Self::Static => 0,
            Self::Breathe => 1,
            Self::ColorCycle => 2,
            Self::Rainbow => 3,
        }
    }

    pub fn next(self) -> Self {
        cycle_next(&Self::CYCLE, self)
    }
}

/// GPU operating mode targets used by the auto-mode derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuMode {
    Eco,
    Standard,
    Ultimate,
}

impl GpuMode {
    pub fn as_raw(self) -> i64 {
        match self {
            Self::Eco => 0,
            Self::Standard => 1,
            Self::Ultimate => 2,
        }
    }
}

fn cycle_next<T: Copy + PartialEq>(cycle: &[T], current: T) -> T {
    let pos = cycle.iter().position(|&m| m == current).unwrap_or(0);
    cycle[(pos + 1) % cycle.len()]
}
