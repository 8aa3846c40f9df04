//! asus-wmi platform driver.
//!
//! Mode values are plain integers behind sysfs attributes of the
//! `asus-nb-wmi` platform device (charge limit lives under the battery
//! supply instead). Hotkey events arrive as acpid socket lines; the code
//! field is forwarded verbatim to the dispatcher.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::UnixStream,
    sync::mpsc,
};

use crate::{
    modes::ModeSetting,
    transport::{EventCode, HardwareTransport},
};

/// Filesystem locations the driver talks to. Parameterized so tests can
/// point everything at a scratch directory.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    pub platform_dir: PathBuf,
    pub battery_dir: PathBuf,
    pub acpi_socket: PathBuf,
}

impl PlatformPaths {
    pub fn system_defaults() -> Self {
        Self {
            platform_dir: PathBuf::from("/sys/devices/platform/asus-nb-wmi"),
            battery_dir: PathBuf::from("/sys/class/power_supply/BAT0"),
            acpi_socket: PathBuf::from("/var/run/acpid.socket"),
        }
    }
}

pub struct AsusWmiTransport {
    paths: PlatformPaths,
}

impl AsusWmiTransport {
    pub fn new(paths: PlatformPaths) -> Self {
        Self { paths }
    }

    /// Checks that the platform device is present. The daemon can still
    /// run without it (every set_mode degrades to a logged failure), but
    /// startup logs should say so loudly.
    pub fn probe(paths: PlatformPaths) -> Self {
        if paths.platform_dir.exists() {
            info!("asus-wmi platform at {}", paths.platform_dir.display());
        } else {
            warn!(
                "asus-wmi platform not found at {}; mode writes will fail",
                paths.platform_dir.display()
            );
        }
        Self::new(paths)
    }

    fn attribute_path(&self, setting: ModeSetting) -> PathBuf {
        match setting {
            ModeSetting::PerformanceMode => self.paths.platform_dir.join("throttle_thermal_policy"),
            ModeSetting::GpuMode => self.paths.platform_dir.join("gpu_mux_mode"),
            ModeSetting::ScreenMode => self.paths.platform_dir.join("panel_od"),
            ModeSetting::AuraMode => self.paths.platform_dir.join("kbd_rgb_mode"),
            ModeSetting::ChargeLimit => self.paths.battery_dir.join("charge_control_end_threshold"),
        }
    }
}

/// Parses one acpid socket line into an event code.
///
/// asus-wmi hotkey lines look like `asus-wmi ASUS0100:00 000000ae 00000000`;
/// the third field is the hex event code. Lines from other subsystems are
/// not ours and yield `None`.
fn parse_acpi_line(line: &str) -> Option<EventCode> {
    let mut fields = line.split_whitespace();
    let source = fields.next()?;
    if !source.starts_with("asus") {
        return None;
    }
    let _device = fields.next()?;
    let code = fields.next()?;
    EventCode::from_str_radix(code.trim_start_matches("0x"), 16).ok()
}

#[async_trait]
impl HardwareTransport for AsusWmiTransport {
    async fn set_mode(&self, setting: ModeSetting, value: i64) -> Result<()> {
        let path = self.attribute_path(setting);
        tokio::fs::write(&path, value.to_string())
            .await
            .with_context(|| format!("Failed to write {} to {}", value, path.display()))
    }

    async fn get_mode(&self, setting: ModeSetting) -> Result<i64> {
        let path = self.attribute_path(setting);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        content
            .trim()
            .parse::<i64>()
            .with_context(|| format!("Non-integer mode value in {}", path.display()))
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<EventCode>> {
        let stream = UnixStream::connect(&self.paths.acpi_socket)
            .await
            .with_context(|| {
                format!("Failed to connect to {}", self.paths.acpi_socket.display())
            })?;

        let (tx, rx) = mpsc::channel(64);

        // Reader task owned by the transport; ends when acpid closes the
        // socket or the receiver is dropped.
        tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(code) = parse_acpi_line(&line) {
                            if tx.send(code).await.is_err() {
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        warn!("acpid socket closed");
                        break;
                    }
                    Err(e) => {
                        warn!("acpid socket read error: {e}");
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}
