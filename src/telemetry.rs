//! Read-only hardware telemetry.
//!
//! A leaf polling utility with no effect on dispatch logic: two named
//! counters read independently, each degrading to "unavailable" on its own
//! failure. The raw thermal counter reports Kelvin and needs the fixed
//! -273 offset; the raw discharge counter needs the fixed /1000 unit
//! conversion.

use std::{fs, path::PathBuf};

use log::debug;

const KELVIN_OFFSET: f32 = 273.0;
const DISCHARGE_DIVISOR: f32 = 1000.0;

/// One snapshot of the telemetry counters. `None` means the counter was
/// unavailable at read time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    pub cpu_temperature: Option<f32>,
    pub battery_discharge: Option<f32>,
}

/// The two sysfs counters armouryd polls.
#[derive(Debug, Clone)]
pub struct SensorCounters {
    thermal_path: PathBuf,
    discharge_path: PathBuf,
}

impl SensorCounters {
    pub fn new(thermal_path: PathBuf, discharge_path: PathBuf) -> Self {
        Self {
            thermal_path,
            discharge_path,
        }
    }

    /// Counter locations on a stock ASUS laptop.
    pub fn system_defaults() -> Self {
        Self::new(
            PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            PathBuf::from("/sys/class/power_supply/BAT0/power_now"),
        )
    }

    /// Reads both counters. Failures are independent per field and never
    /// fail the whole read.
    pub fn read_sensors(&self) -> SensorReading {
        let cpu_temperature = match self.read_raw(&self.thermal_path) {
            Some(raw) => Some(raw - KELVIN_OFFSET),
            None => {
                debug!("Thermal counter unavailable");
                None
            }
        };

        let battery_discharge = match self.read_raw(&self.discharge_path) {
            Some(raw) => Some(raw / DISCHARGE_DIVISOR),
            None => {
                debug!("Discharge counter unavailable");
                None
            }
        };

        SensorReading {
            cpu_temperature,
            battery_discharge,
        }
    }

    fn read_raw(&self, path: &std::path::Path) -> Option<f32> {
        fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse::<f32>().ok())
    }
}
