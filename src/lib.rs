//! # armouryd
//!
//! A Linux daemon for ASUS ROG laptop hotkeys and hardware modes.
//!
//! ## Features
//!
//! - **Async Architecture**: Built on Tokio for high performance
//! - **Event-Driven**: Modular services communicate via EventBus
//! - **Hotkey Dispatch**: Configurable bindings for the M3/M4 keys,
//!   fixed cycles for Fn+F5 and Fn+F4
//! - **Auto Modes**: Per-power-source GPU, screen and performance targets
//! - **Charge Limit**: Battery charge threshold enforcement
//! - **Telemetry**: CPU temperature and battery discharge polling
//! - **D-Bus Interface**: Signals and methods for an external settings GUI
//! - **Hot Reload**: Settings file changes picked up without restart
//!
//! ## Architecture
//!
//! The daemon uses a provider-based dependency injection system with:
//! - [`SystemCoordinator`](coordinator::SystemCoordinator) - Main lifecycle manager
//! - [`EventBus`](event::EventBus) - Inter-service communication
//! - [`AppState`](app_context::AppState) - Shared application state
//! - Service providers for modular functionality
//!
//! ## Example
//!
//! ```no_run
//! use armouryd::{application::Application, settings::SettingsManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = SettingsManager::load(None).await?;
//!     Application::builder()
//!         .with_settings(settings)
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

pub mod app_context;
pub mod application;
pub mod automode;
pub mod coordinator;
pub mod dispatcher;
pub mod drivers;
pub mod event;
pub mod interface;
pub mod launcher;
pub mod media;
pub mod modes;
pub mod power;
pub mod providers;
pub mod settings;
pub mod task_manager;
pub mod telemetry;
pub mod transport;
