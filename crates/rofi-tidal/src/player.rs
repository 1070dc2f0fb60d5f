//! Player process lifecycle on top of the one-shot IPC client.
//!
//! Exactly one mpv may own the control socket.  Starting a track always
//! quits whatever is there first; nothing is ever queued.

use crate::mpv::IpcClient;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tidal_proto::config::PlayerConfig;
use tracing::{debug, info, warn};

/// Shown while mpv is up but has not reported a title yet.
pub const LOADING_TITLE: &str = "Loading...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub title: Option<String>,
    pub state: PlayerState,
}

impl NowPlaying {
    pub fn stopped() -> Self {
        Self {
            title: None,
            state: PlayerState::Stopped,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("mpv binary not found")]
    MpvNotFound,
    #[error("failed to spawn mpv: {0}")]
    Spawn(#[from] std::io::Error),
}

#[async_trait]
pub trait Player: Send + Sync {
    /// Recomputed from scratch on every call; an unreachable player is
    /// indistinguishable from a stopped one.
    async fn now_playing(&self) -> NowPlaying;
    async fn start(&self, url: &str, title: &str) -> Result<(), PlayerError>;
    async fn stop(&self);
    async fn toggle_pause(&self);
}

pub struct MpvPlayer {
    ipc: IpcClient,
    socket: PathBuf,
    binary: Option<PathBuf>,
    start_delay: Duration,
    notify: bool,
    title_prefix: String,
}

impl MpvPlayer {
    pub fn new(config: &PlayerConfig, socket: PathBuf) -> Self {
        Self {
            ipc: IpcClient::new(socket.clone()),
            socket,
            binary: config.mpv_binary.clone(),
            start_delay: Duration::from_millis(config.start_delay_ms),
            notify: config.notify,
            title_prefix: config.title_prefix.clone(),
        }
    }

    /// True only if some process was started with our socket as its IPC
    /// server.  A stale socket file left behind by a crashed mpv does not
    /// count.
    pub async fn is_running(&self) -> bool {
        if !self.socket.exists() {
            return false;
        }
        let pattern = format!("input-ipc-server={}", self.socket.display());
        match tokio::process::Command::new("pgrep")
            .arg("-f")
            .arg("--")
            .arg(&pattern)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) => status.success(),
            Err(e) => {
                debug!("player: pgrep failed: {}", e);
                false
            }
        }
    }

    /// A configured binary is used as-is and never falls back to `PATH`.
    fn mpv_binary(&self) -> Option<PathBuf> {
        match &self.binary {
            Some(path) => Some(path.clone()).filter(|path| path.is_file()),
            None => tidal_proto::platform::find_mpv_binary(),
        }
    }

    fn spawn_args(&self, url: &str, title: &str) -> Vec<String> {
        vec![
            "--no-video".to_string(),
            "--force-window=no".to_string(),
            "--no-terminal".to_string(),
            tidal_proto::platform::mpv_socket_arg(&self.socket),
            format!("--title={}: {}", self.title_prefix, title),
            url.to_string(),
        ]
    }

    fn notify_playing(&self, title: &str) {
        let result = tokio::process::Command::new("notify-send")
            .arg("-i")
            .arg("audio-x-generic")
            .arg(&self.title_prefix)
            .arg(format!("Playing: {}", title))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(e) = result {
            warn!("player: notify-send failed: {}", e);
        }
    }
}

#[async_trait]
impl Player for MpvPlayer {
    async fn now_playing(&self) -> NowPlaying {
        if !self.is_running().await {
            return NowPlaying::stopped();
        }

        let title = self
            .ipc
            .get_property("media-title")
            .await
            .and_then(|v| v.as_str().map(str::to_owned))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| LOADING_TITLE.to_string());
        let paused = self
            .ipc
            .get_property("pause")
            .await
            .is_some_and(|v| truthy(&v));

        NowPlaying {
            title: Some(title),
            state: if paused {
                PlayerState::Paused
            } else {
                PlayerState::Playing
            },
        }
    }

    async fn start(&self, url: &str, title: &str) -> Result<(), PlayerError> {
        self.stop().await;
        // Give the old process a moment to release the socket path.
        tokio::time::sleep(self.start_delay).await;

        let binary = self.mpv_binary().ok_or(PlayerError::MpvNotFound)?;
        let child = tokio::process::Command::new(&binary)
            .args(self.spawn_args(url, title))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        info!("player: spawned mpv pid={:?} for {:?}", child.id(), title);
        // Dropping the handle leaves mpv running after we exit.
        drop(child);

        if self.notify {
            self.notify_playing(title);
        }
        Ok(())
    }

    async fn stop(&self) {
        let _ = self.ipc.send_command(json!(["quit"])).await;
    }

    async fn toggle_pause(&self) {
        let _ = self.ipc.send_command(json!(["cycle", "pause"])).await;
    }
}

/// Loose truthiness for mpv property values.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpv::tests::FakeMpv;

    fn config() -> PlayerConfig {
        PlayerConfig {
            start_delay_ms: 0,
            notify: false,
            ..PlayerConfig::default()
        }
    }

    #[test]
    fn test_truthy() {
        assert!(truthy(&json!(true)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&Value::Null));
        assert!(truthy(&json!(1)));
        assert!(!truthy(&json!("")));
    }

    #[test]
    fn test_spawn_args() {
        let player = MpvPlayer::new(&config(), PathBuf::from("/tmp/x.sock"));
        assert_eq!(
            player.spawn_args("https://cdn/track.flac", "Main - Band"),
            vec![
                "--no-video",
                "--force-window=no",
                "--no-terminal",
                "--input-ipc-server=/tmp/x.sock",
                "--title=Tidal: Main - Band",
                "https://cdn/track.flac",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_socket_means_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let player = MpvPlayer::new(&config(), dir.path().join("none.sock"));
        assert!(!player.is_running().await);
        assert_eq!(player.now_playing().await, NowPlaying::stopped());
        // Controls against nothing are silent no-ops.
        player.toggle_pause().await;
        player.stop().await;
    }

    #[tokio::test]
    async fn test_socket_without_owner_process_is_stopped() {
        // A listening socket alone is not enough: no mpv was started with
        // this path as its IPC server.
        let mpv = FakeMpv::spawn(|_| "{\"data\":\"Ghost\",\"error\":\"success\"}\n".into());
        let player = MpvPlayer::new(&config(), mpv.socket());
        assert_eq!(player.now_playing().await, NowPlaying::stopped());
    }

    #[tokio::test]
    async fn test_start_quits_running_player_before_spawning() {
        let mpv = FakeMpv::spawn(|_| "{\"data\":null,\"error\":\"success\"}\n".into());
        let stub = tidal_proto::platform::find_on_path("true").unwrap();
        let player = MpvPlayer::new(
            &PlayerConfig {
                mpv_binary: Some(stub),
                ..config()
            },
            mpv.socket(),
        );

        player
            .start("https://cdn/track.flac", "Main - Band")
            .await
            .unwrap();
        let sent = mpv.received.lock().unwrap().clone();
        assert_eq!(sent, vec![json!({ "command": ["quit"] })]);
    }

    #[tokio::test]
    async fn test_start_without_binary_fails() {
        let mpv = FakeMpv::spawn(|_| "{\"data\":null,\"error\":\"success\"}\n".into());
        let player = MpvPlayer::new(
            &PlayerConfig {
                mpv_binary: Some(mpv.dir.path().join("no-such-mpv")),
                ..config()
            },
            mpv.socket(),
        );

        let result = player.start("https://cdn/track.flac", "Main - Band").await;
        assert!(matches!(result, Err(PlayerError::MpvNotFound)));
        // The old player is still told to quit first.
        let sent = mpv.received.lock().unwrap().clone();
        assert_eq!(sent, vec![json!({ "command": ["quit"] })]);
    }

    #[tokio::test]
    async fn test_controls_send_expected_commands() {
        let mpv = FakeMpv::spawn(|_| "{\"data\":null,\"error\":\"success\"}\n".into());
        let player = MpvPlayer::new(&config(), mpv.socket());
        player.toggle_pause().await;
        player.stop().await;
        let sent = mpv.received.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![
                json!({ "command": ["cycle", "pause"] }),
                json!({ "command": ["quit"] }),
            ]
        );
    }
}
