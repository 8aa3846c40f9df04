//! System coordinator for managing service lifecycle and dependency injection.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::{
    app_context::AppState,
    automode::AutoModeController,
    dispatcher::ActionDispatcher,
    event::{Event, EventBus},
    modes::{ModeSetting, keys},
    power::PowerState,
    providers::{
        AppStateProvider, AsyncProvider, DBusServiceProvider, HotkeyServiceProvider,
        PowerServiceProvider, ServiceProvider, SettingsWatcherServiceProvider,
        TelemetryServiceProvider,
    },
    settings::SettingsManager,
    task_manager::TaskManager,
};

/// SystemCoordinator with a provider-based dependency injection pattern.
///
/// Owns the single event-consuming main loop: every hardware event and
/// power transition is handled here, one at a time, which is the ordering
/// guarantee the dispatch path relies on. Services only publish.
///
/// # Features
/// - Service prioritization (critical vs non-critical)
/// - Graceful degradation on service failures
/// - Event-driven communication between services
/// - Proper async initialization and shutdown
pub struct SystemCoordinator {
    task_manager: TaskManager,
    event_bus: EventBus,
    shared_state: Option<Arc<AppState>>,
    service_providers: Vec<Box<dyn ServiceProvider>>,
    dispatcher: Option<ActionDispatcher>,
    automode: Option<AutoModeController>,
    /// Subscribed during initialization, before any service can publish,
    /// so the power service's initial state event is never missed.
    event_rx: Option<broadcast::Receiver<Event>>,
    power_monitoring: bool,
}

impl Default for SystemCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCoordinator {
    pub fn new() -> Self {
        Self {
            task_manager: TaskManager::new(),
            event_bus: EventBus::new(),
            shared_state: None,
            service_providers: Vec::new(),
            dispatcher: None,
            automode: None,
            event_rx: None,
            power_monitoring: false,
        }
    }

    /// Asynchronously initializes all components.
    pub async fn initialize(&mut self, settings: SettingsManager) -> Result<()> {
        info!("Initializing SystemCoordinator...");

        self.event_rx = Some(self.event_bus.subscribe());

        let state = AppStateProvider::new(settings)
            .provide()
            .await
            .context("Failed to initialize application state")?;
        self.shared_state = Some(state.clone());

        self.dispatcher = Some(ActionDispatcher::new(
            state.settings.clone(),
            state.transport.clone(),
            state.media.clone(),
            self.event_bus.clone(),
        ));
        self.automode = Some(AutoModeController::new(
            state.settings.clone(),
            state.transport.clone(),
            self.event_bus.clone(),
        ));

        self.apply_stored_modes(&state).await;

        self.register_service_providers(state)
            .await
            .context("Failed to register service providers")?;

        info!("SystemCoordinator initialization completed");
        Ok(())
    }

    /// Pushes the persisted performance and lighting modes to the hardware
    /// once at startup, so a reboot lands in the modes the user last chose.
    /// Power-dependent modes are handled by the auto-mode path instead.
    async fn apply_stored_modes(&self, state: &Arc<AppState>) {
        for (setting, key) in [
            (ModeSetting::PerformanceMode, keys::PERFORMANCE_MODE),
            (ModeSetting::AuraMode, keys::AURA_MODE),
        ] {
            let Some(value) = state.settings.get_int(key).await else {
                continue;
            };
            if let Err(e) = state.transport.set_mode(setting, value).await {
                warn!("Failed to restore {} at startup: {e}", setting.name());
            }
        }
    }

    /// Registers all service providers with prioritization.
    async fn register_service_providers(&mut self, state: Arc<AppState>) -> Result<()> {
        let mut providers: Vec<Box<dyn ServiceProvider>> = vec![
            Box::new(HotkeyServiceProvider::new(
                state.clone(),
                self.event_bus.clone(),
            )),
            Box::new(TelemetryServiceProvider::new(
                state.clone(),
                self.event_bus.clone(),
            )),
            Box::new(SettingsWatcherServiceProvider::new(
                state.clone(),
                self.event_bus.clone(),
            )),
        ];

        match PowerServiceProvider::new(self.event_bus.clone()).await {
            Ok(provider) => {
                self.power_monitoring = true;
                providers.push(Box::new(provider));
            }
            Err(e) => {
                warn!("Failed to create power service provider: {e}, skipping power monitoring");
            }
        }

        match DBusServiceProvider::new(state, self.event_bus.clone()).await {
            Ok(provider) => {
                providers.push(Box::new(provider));
            }
            Err(e) => {
                warn!("Failed to create D-Bus service provider: {e}, skipping D-Bus service");
            }
        }

        providers.sort_by_key(|b| std::cmp::Reverse(b.priority()));
        self.service_providers = providers;

        info!(
            "Registered {} service providers in priority order",
            self.service_providers.len()
        );

        Ok(())
    }

    /// Starts all registered services in priority order.
    ///
    /// Critical services must start successfully, while non-critical
    /// services can fail without stopping the system.
    pub async fn start_all_services(&mut self) -> Result<()> {
        info!(
            "Starting {} services in priority order...",
            self.service_providers.len()
        );

        for provider in &self.service_providers {
            let is_critical = provider.is_critical();

            match provider.start(&mut self.task_manager).await {
                Ok(()) => {
                    info!(
                        "Service '{}' started successfully (priority: {}, critical: {})",
                        provider.name(),
                        provider.priority(),
                        is_critical
                    );
                }
                Err(e) if is_critical => {
                    return Err(e).with_context(|| {
                        format!("Critical service '{}' failed to start", provider.name())
                    });
                }
                Err(e) => {
                    warn!(
                        "Non-critical service '{}' failed to start: {}",
                        provider.name(),
                        e
                    );
                }
            }
        }

        // No power notifications means no PowerChanged event will ever
        // arrive; assume AC so stored targets and charge limit still apply.
        if !self.power_monitoring {
            if let Some(automode) = &self.automode {
                warn!("Power monitoring unavailable, assuming plugged-in state");
                automode.apply_auto_modes(PowerState::Plugged).await;
            }
        }

        info!("All critical services started successfully");
        Ok(())
    }

    /// Main event loop with enhanced error handling.
    pub async fn run_main_loop(&mut self) -> Result<()> {
        let mut event_rx = self
            .event_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("Coordinator not initialized"))?;
        info!("Starting main event loop");

        loop {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    match result {
                        Ok(()) => {
                            info!("Received Ctrl+C, initiating graceful shutdown...");
                            self.shutdown().await
                                .context("Failed to shutdown gracefully after Ctrl+C")?;
                            break;
                        }
                        Err(e) => {
                            bail!("Failed to listen for shutdown signal: {e}");
                        }
                    }
                }

                event = event_rx.recv() => {
                    if !self.handle_event(event).await? {
                        break;
                    }
                }
            }
        }

        info!("Main event loop terminated");
        Ok(())
    }

    /// Handles one application event. Returns `false` when the loop should
    /// stop.
    async fn handle_event(
        &mut self,
        event_result: Result<Event, broadcast::error::RecvError>,
    ) -> Result<bool> {
        match event_result {
            Ok(Event::HardwareEvent(code)) => {
                if let Some(dispatcher) = &self.dispatcher {
                    dispatcher.dispatch(code).await;
                }
            }
            Ok(Event::PowerChanged(state)) => {
                if let Some(automode) = &self.automode {
                    automode.apply_auto_modes(state).await;
                }
            }
            Ok(Event::SystemShutdown) => {
                info!("Processing SystemShutdown event");
                self.shutdown()
                    .await
                    .context("Failed to shutdown gracefully after SystemShutdown event")?;
                return Ok(false);
            }
            Ok(event) => {
                debug!("Received event: {event:?}");
            }
            Err(broadcast::error::RecvError::Closed) => {
                bail!("Event bus channel closed unexpectedly");
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Event bus lagged by {n} messages");
            }
        }
        Ok(true)
    }

    /// Performs graceful shutdown of all components.
    async fn shutdown(&mut self) -> Result<()> {
        info!("Initiating graceful shutdown...");

        if let Err(e) = self.task_manager.shutdown_all().await {
            log::error!("Error during task shutdown: {e}");
        }

        info!("Shutdown complete");
        Ok(())
    }

    /// Returns a reference to the EventBus for testing purposes.
    #[allow(dead_code)]
    pub const fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    #[allow(dead_code)]
    pub fn running_services(&self) -> Vec<&'static str> {
        self.service_providers.iter().map(|p| p.name()).collect()
    }
}
