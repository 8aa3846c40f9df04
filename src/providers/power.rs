//! Power source monitoring service provider.

use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use zbus::Connection;

use crate::{
    event::{Event, EventBus},
    power::{PowerState, UPowerProxy},
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

/// Power source monitoring service provider.
///
/// Watches UPower's `OnBattery` property on the system bus and publishes a
/// `PowerChanged` event on every transition, plus one for the state found
/// at startup so the stored per-power-state targets get applied before the
/// first physical plug or unplug.
///
/// - **Priority**: 7
/// - **Critical**: No (without UPower the daemon keeps plugged-in targets)
pub struct PowerServiceProvider {
    event_bus: EventBus,
    connection: Connection,
}

impl PowerServiceProvider {
    /// Connects to the system bus. Fails when no system bus is reachable,
    /// which the coordinator treats as a degraded but running state.
    pub async fn new(event_bus: EventBus) -> Result<Self> {
        let connection = Connection::system().await?;
        Ok(Self {
            event_bus,
            connection,
        })
    }
}

#[async_trait]
impl ServiceProvider for PowerServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let event_bus = self.event_bus.clone();
        let connection = self.connection.clone();

        task_manager
            .spawn_task(self.name().to_string(), |cancel_token| async move {
                run_power_service(connection, event_bus, cancel_token).await
            })
            .await
    }

    fn name(&self) -> &'static str {
        "PowerService"
    }

    fn priority(&self) -> i32 {
        7
    }
}

async fn run_power_service(
    connection: Connection,
    event_bus: EventBus,
    cancel_token: CancellationToken,
) -> Result<()> {
    let upower = UPowerProxy::new(&connection).await?;

    let initial = PowerState::from_on_battery(upower.on_battery().await?);
    info!("Initial power source: {initial:?}");
    if let Err(e) = event_bus.publish(Event::PowerChanged(initial)) {
        warn!("Failed to publish initial power state: {e}");
    }

    let mut changes = upower.receive_on_battery_changed().await;
    let mut last = initial;

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Power service cancelled");
                break;
            }
            change = changes.next() => {
                let Some(change) = change else {
                    warn!("UPower property stream ended");
                    break;
                };
                match change.get().await {
                    Ok(on_battery) => {
                        let state = PowerState::from_on_battery(on_battery);
                        // UPower occasionally re-emits the current value.
                        if state == last {
                            continue;
                        }
                        last = state;
                        info!("Power source changed: {state:?}");
                        if let Err(e) = event_bus.publish(Event::PowerChanged(state)) {
                            warn!("Failed to publish power change: {e}");
                        }
                    }
                    Err(e) => warn!("Failed to read OnBattery property: {e}"),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn provider_metadata() {
        // Creation needs a system bus; metadata is tested where available.
        if let Ok(provider) = PowerServiceProvider::new(EventBus::new()).await {
            assert_eq!(provider.name(), "PowerService");
            assert_eq!(provider.priority(), 7);
            assert!(!provider.is_critical());
        }
    }
}
