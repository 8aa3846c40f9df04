//! Application state provider for dependency injection.

use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

use crate::{
    app_context::AppState,
    drivers::asus_wmi::{AsusWmiTransport, PlatformPaths},
    media::{MediaSink, MprisMediaSink, UnavailableMediaSink},
    providers::traits::AsyncProvider,
    settings::SettingsManager,
    telemetry::SensorCounters,
};

/// Provider for creating and initializing application state.
///
/// Probes the platform driver and connects the media sink; either may be
/// absent (bare desktop, no session bus) without preventing startup.
pub struct AppStateProvider {
    settings: SettingsManager,
}

impl AppStateProvider {
    pub const fn new(settings: SettingsManager) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl AsyncProvider<Arc<AppState>> for AppStateProvider {
    async fn provide(&self) -> Result<Arc<AppState>> {
        let transport = Arc::new(AsusWmiTransport::probe(PlatformPaths::system_defaults()));

        let media: Arc<dyn MediaSink> = match MprisMediaSink::connect().await {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                warn!("Media control disabled: {e}");
                Arc::new(UnavailableMediaSink)
            }
        };

        Ok(Arc::new(AppState::new(
            self.settings.clone(),
            transport,
            media,
            SensorCounters::system_defaults(),
        )))
    }
}
