//! Media control seam for the toggle-media and mute-media actions.
//!
//! The hotkeys ultimately poke whatever media player is active; on Linux
//! that is MPRIS over the session bus. The dispatcher only sees the
//! [`MediaSink`] trait, so tests run against mocks.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::Mutex;
use zbus::{Connection, Proxy, fdo::DBusProxy};

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
const PLAYER_PATH: &str = "/org/mpris/MediaPlayer2";
const PLAYER_IFACE: &str = "org.mpris.MediaPlayer2.Player";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaSink: Send + Sync {
    /// Play/pause toggle on the active player.
    async fn play_pause(&self) -> Result<()>;

    /// Mute toggle: drops the active player's volume to zero, restoring
    /// the previous level on the next invocation.
    async fn toggle_mute(&self) -> Result<()>;
}

/// MPRIS-backed media sink over the session bus.
pub struct MprisMediaSink {
    connection: Connection,
    saved_volume: Mutex<Option<f64>>,
}

impl MprisMediaSink {
    pub async fn connect() -> Result<Self> {
        Ok(Self {
            connection: Connection::session().await?,
            saved_volume: Mutex::new(None),
        })
    }

    /// Finds the first registered MPRIS player on the bus.
    async fn player_proxy(&self) -> Result<Proxy<'_>> {
        let dbus = DBusProxy::new(&self.connection).await?;
        let name = dbus
            .list_names()
            .await?
            .into_iter()
            .find(|name| name.as_str().starts_with(MPRIS_PREFIX))
            .ok_or_else(|| anyhow!("No active MPRIS media player on the session bus"))?;

        Ok(Proxy::new(&self.connection, name, PLAYER_PATH, PLAYER_IFACE).await?)
    }
}

/// Stand-in sink used when no session bus is reachable at startup.
/// Every call fails; the dispatcher logs and carries on.
pub struct UnavailableMediaSink;

#[async_trait]
impl MediaSink for UnavailableMediaSink {
    async fn play_pause(&self) -> Result<()> {
        Err(anyhow!("Media control unavailable: no session bus"))
    }

    async fn toggle_mute(&self) -> Result<()> {
        Err(anyhow!("Media control unavailable: no session bus"))
    }
}

#[async_trait]
impl MediaSink for MprisMediaSink {
    async fn play_pause(&self) -> Result<()> {
        let player = self.player_proxy().await?;
        player.call_method("PlayPause", &()).await?;
        Ok(())
    }

    async fn toggle_mute(&self) -> Result<()> {
        let player = self.player_proxy().await?;
        let current: f64 = player.get_property("Volume").await?;

        let mut saved = self.saved_volume.lock().await;
        if current > 0.0 {
            *saved = Some(current);
            player.set_property("Volume", 0.0f64).await?;
        } else {
            player
                .set_property("Volume", saved.take().unwrap_or(1.0))
                .await?;
        }
        Ok(())
    }
}
