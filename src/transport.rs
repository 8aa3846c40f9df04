//! Hardware transport seam.
//!
//! The daemon consumes the platform firmware through this trait only:
//! discrete get/set per [`ModeSetting`] plus a subscription yielding the
//! raw integer event codes the firmware emits on hotkey presses. The
//! production implementation lives in [`crate::drivers::asus_wmi`]; tests
//! substitute mocks.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::modes::ModeSetting;

/// Integer identifier for a hardware-originated event.
pub type EventCode = u32;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HardwareTransport: Send + Sync {
    /// Applies a mode value. The firmware treats writes of the current
    /// value as no-ops, which is what makes auto-mode application
    /// idempotent from the hardware's point of view.
    async fn set_mode(&self, setting: ModeSetting, value: i64) -> Result<()>;

    async fn get_mode(&self, setting: ModeSetting) -> Result<i64>;

    /// Subscribes to the firmware event stream. Codes arrive in emission
    /// order on the returned channel; the receiver side is responsible for
    /// serialized handling.
    async fn subscribe(&self) -> Result<mpsc::Receiver<EventCode>>;
}
