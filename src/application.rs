//! Application entry point and builder pattern implementation.

use crate::{coordinator::SystemCoordinator, settings::SettingsManager};
use anyhow::Result;

/// Main application structure that orchestrates all daemon components.
///
/// Manages the complete lifecycle from initialization to shutdown,
/// coordinating all services through the SystemCoordinator.
///
/// # Example
///
/// ```no_run
/// use armouryd::{application::Application, settings::SettingsManager};
///
/// # async fn example() -> anyhow::Result<()> {
/// let settings = SettingsManager::load(None).await?;
/// let mut app = Application::builder()
///     .with_settings(settings)
///     .build()
///     .await?;
///
/// app.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Application {
    pub coordinator: SystemCoordinator,
    settings: SettingsManager,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Runs the complete daemon lifecycle: initialize, start services, and
    /// run the main loop.
    pub async fn run(&mut self) -> Result<()> {
        self.coordinator.initialize(self.settings.clone()).await?;

        self.coordinator.start_all_services().await?;

        self.coordinator.run_main_loop().await?;

        Ok(())
    }
}

/// Builder pattern for creating Application instances.
pub struct ApplicationBuilder {
    settings: Option<SettingsManager>,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self { settings: None }
    }

    /// Sets the settings manager for the application.
    pub fn with_settings(mut self, settings: SettingsManager) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Builds the Application instance with the provided settings.
    pub async fn build(self) -> Result<Application> {
        let settings = self
            .settings
            .ok_or_else(|| anyhow::anyhow!("Settings manager is required"))?;

        Ok(Application {
            coordinator: SystemCoordinator::new(),
            settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::path::PathBuf;

    #[tokio::test]
    async fn builder_requires_settings() {
        assert!(Application::builder().build().await.is_err());
    }

    #[tokio::test]
    async fn builder_with_settings_constructs_application() {
        let settings = SettingsManager::new(Settings::default(), PathBuf::from("/dev/null"));
        let app = Application::builder()
            .with_settings(settings)
            .build()
            .await
            .unwrap();
        assert!(app.coordinator.running_services().is_empty());
    }
}
