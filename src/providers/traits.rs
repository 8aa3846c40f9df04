use anyhow::Result;
use async_trait::async_trait;

use crate::task_manager::TaskManager;

/// Base trait for providers that can create components asynchronously.
///
/// Enables dependency injection with async initialization support.
///
/// # Example
///
/// ```no_run
/// use armouryd::providers::traits::AsyncProvider;
///
/// struct SettingsPathProvider;
///
/// #[async_trait::async_trait]
/// impl AsyncProvider<String> for SettingsPathProvider {
///     async fn provide(&self) -> anyhow::Result<String> {
///         Ok("/etc/armouryd/settings.yml".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncProvider<T> {
    async fn provide(&self) -> Result<T>;
}

/// Trait for services that can be started through TaskManager.
///
/// Provides service lifecycle management with prioritization and
/// criticality classification for graceful degradation.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Starts the service in TaskManager.
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()>;

    /// Returns service name for logging and management.
    fn name(&self) -> &'static str;

    /// Returns startup priority (higher numbers start first).
    fn priority(&self) -> i32 {
        0
    }

    /// Indicates if service is critical for system operation.
    fn is_critical(&self) -> bool {
        false
    }
}
