//! Settings file monitoring service provider.

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use notify::{Event, EventHandler, RecursiveMode, Watcher, recommended_watcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    app_context::AppState,
    event::{Event as AppEvent, EventBus},
    providers::traits::ServiceProvider,
    task_manager::TaskManager,
};

const DEBOUNCE_INTERVAL: Duration = Duration::from_millis(2000);

/// Settings file monitoring service provider.
///
/// The external settings surface writes the same flat file the daemon
/// persists into. This service watches the file with filesystem
/// notifications (inotify on Linux), reloads the store on change, and
/// publishes `SettingsReloaded`. Rapid change bursts are debounced so a
/// save from a GUI slider drag reloads once.
///
/// - **Priority**: 6
/// - **Critical**: No
pub struct SettingsWatcherServiceProvider {
    state: Arc<AppState>,
    event_bus: EventBus,
}

impl SettingsWatcherServiceProvider {
    pub fn new(state: Arc<AppState>, event_bus: EventBus) -> Self {
        Self { state, event_bus }
    }
}

#[async_trait]
impl ServiceProvider for SettingsWatcherServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let state = self.state.clone();
        let event_bus = self.event_bus.clone();

        task_manager
            .spawn_task(self.name().to_string(), |cancel_token| async move {
                run_settings_watcher_service(state, event_bus, cancel_token).await
            })
            .await
    }

    fn name(&self) -> &'static str {
        "SettingsWatcherService"
    }

    fn priority(&self) -> i32 {
        6
    }
}

/// Bridges notify's callback API into an async channel.
#[derive(Debug)]
struct AsyncEventHandler {
    sender: mpsc::UnboundedSender<notify::Result<Event>>,
}

impl EventHandler for AsyncEventHandler {
    fn handle_event(&mut self, event: notify::Result<Event>) {
        if let Err(e) = self.sender.send(event) {
            error!("Failed to forward filesystem event: {e}");
        }
    }
}

async fn run_settings_watcher_service(
    state: Arc<AppState>,
    event_bus: EventBus,
    cancel_token: CancellationToken,
) -> Result<()> {
    let settings_path = state.settings.path().to_path_buf();
    info!("Settings watcher started for: {}", settings_path.display());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut watcher = recommended_watcher(AsyncEventHandler { sender: event_tx })?;

    // Watch the parent directory: editors and the daemon itself replace
    // the file via rename, which would drop a watch on the file inode.
    let watch_path = settings_path
        .parent()
        .map_or_else(|| settings_path.clone(), |p| p.to_path_buf());
    watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;

    let mut debounce_interval = tokio::time::interval(DEBOUNCE_INTERVAL);
    debounce_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut has_pending_event = false;

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Settings watcher service cancelled");
                break;
            }

            event_result = event_rx.recv() => {
                match event_result {
                    Some(Ok(event)) => {
                        let affects_settings = event.paths.iter().any(|path| {
                            path == &settings_path
                                || path.file_name() == settings_path.file_name()
                        });
                        let is_relevant = event.kind.is_modify() || event.kind.is_create();

                        if affects_settings && is_relevant {
                            debug!("Settings file touched, scheduling debounced reload");
                            has_pending_event = true;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Filesystem watcher error: {e}");
                    }
                    None => {
                        warn!("Filesystem event channel closed, exiting");
                        break;
                    }
                }
            }

            _ = debounce_interval.tick(), if has_pending_event => {
                has_pending_event = false;

                if !settings_path.exists() {
                    warn!("Settings file {} no longer exists", settings_path.display());
                    continue;
                }

                match state.settings.reload().await {
                    Ok(()) => {
                        info!("Settings reloaded after external change");
                        if let Err(e) = event_bus.publish(AppEvent::SettingsReloaded) {
                            warn!("Failed to publish settings reload: {e}");
                        }
                    }
                    Err(e) => error!("Failed to reload settings: {e}"),
                }
            }
        }
    }

    if let Err(e) = watcher.unwatch(&watch_path) {
        warn!("Failed to unwatch path during cleanup: {e}");
    }

    info!("Settings watcher service stopped");
    Ok(())
}
