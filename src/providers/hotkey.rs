//! Hotkey event service provider.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    app_context::AppState,
    event::{Event, EventBus},
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

/// Hotkey event forwarding service provider.
///
/// Subscribes to the hardware transport's event stream and republishes
/// every code on the event bus, where the coordinator's main loop picks
/// it up for serialized dispatch. This is the daemon's reason to exist:
/// without it no physical key does anything.
///
/// - **Priority**: 10 (highest)
/// - **Critical**: Yes
pub struct HotkeyServiceProvider {
    state: Arc<AppState>,
    event_bus: EventBus,
}

impl HotkeyServiceProvider {
    pub fn new(state: Arc<AppState>, event_bus: EventBus) -> Self {
        Self { state, event_bus }
    }
}

#[async_trait]
impl ServiceProvider for HotkeyServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let state = self.state.clone();
        let event_bus = self.event_bus.clone();

        task_manager
            .spawn_task(self.name().to_string(), |cancel_token| async move {
                run_hotkey_service(state, event_bus, cancel_token).await
            })
            .await
    }

    fn name(&self) -> &'static str {
        "HotkeyService"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn is_critical(&self) -> bool {
        true
    }
}

async fn run_hotkey_service(
    state: Arc<AppState>,
    event_bus: EventBus,
    cancel_token: CancellationToken,
) -> Result<()> {
    let mut events = state
        .transport
        .subscribe()
        .await
        .context("Failed to subscribe to hardware events")?;

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Hotkey service cancelled");
                break;
            }
            code = events.recv() => {
                match code {
                    Some(code) => {
                        if let Err(e) = event_bus.publish(Event::HardwareEvent(code)) {
                            warn!("Failed to publish hardware event {code}: {e}");
                        }
                    }
                    None => {
                        warn!("Hardware event stream closed");
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        media::MockMediaSink,
        settings::{Settings, SettingsManager},
        telemetry::SensorCounters,
        transport::MockHardwareTransport,
    };
    use std::{path::PathBuf, time::Duration};
    use tokio::{
        sync::mpsc,
        time::{sleep, timeout},
    };

    fn state_with_transport(transport: MockHardwareTransport) -> Arc<AppState> {
        Arc::new(AppState::new(
            SettingsManager::new(Settings::default(), PathBuf::from("/dev/null")),
            Arc::new(transport),
            Arc::new(MockMediaSink::new()),
            SensorCounters::system_defaults(),
        ))
    }

    #[tokio::test]
    async fn forwards_transport_codes_to_the_bus() {
        let (tx, rx) = mpsc::channel(4);
        let mut transport = MockHardwareTransport::new();
        transport
            .expect_subscribe()
            .return_once(move || Ok(rx));

        let state = state_with_transport(transport);
        let event_bus = EventBus::new();
        let mut receiver = event_bus.subscribe();
        let mut task_manager = TaskManager::new();

        let provider = HotkeyServiceProvider::new(state, event_bus);
        assert_eq!(provider.name(), "HotkeyService");
        assert!(provider.is_critical());
        provider.start(&mut task_manager).await.unwrap();

        tx.send(174).await.unwrap();
        tx.send(124).await.unwrap();

        for expected in [174u32, 124] {
            let event = timeout(Duration::from_secs(1), receiver.recv())
                .await
                .unwrap()
                .unwrap();
            match event {
                Event::HardwareEvent(code) => assert_eq!(code, expected),
                other => panic!("Expected HardwareEvent, got {other:?}"),
            }
        }

        task_manager.shutdown_all().await.unwrap();
    }

    #[tokio::test]
    async fn stream_closure_ends_the_service_cleanly() {
        let (tx, rx) = mpsc::channel(4);
        let mut transport = MockHardwareTransport::new();
        transport
            .expect_subscribe()
            .return_once(move || Ok(rx));

        let state = state_with_transport(transport);
        let mut task_manager = TaskManager::new();
        let provider = HotkeyServiceProvider::new(state, EventBus::new());
        provider.start(&mut task_manager).await.unwrap();

        drop(tx);
        sleep(Duration::from_millis(50)).await;

        task_manager.shutdown_all().await.unwrap();
    }

    #[tokio::test]
    async fn failed_subscription_surfaces_at_shutdown() {
        let mut transport = MockHardwareTransport::new();
        transport
            .expect_subscribe()
            .return_once(|| Err(anyhow::anyhow!("no acpid socket")));

        let state = state_with_transport(transport);
        let mut task_manager = TaskManager::new();
        let provider = HotkeyServiceProvider::new(state, EventBus::new());
        provider.start(&mut task_manager).await.unwrap();

        sleep(Duration::from_millis(50)).await;
        assert!(task_manager.shutdown_all().await.is_err());
    }
}
