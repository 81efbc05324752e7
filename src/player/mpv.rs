// ==========================================
// MPV PLAYER BACKEND
// ==========================================
// Plays YouTube tracks by running an external mpv process.
//
// - mpv resolves the watch URL itself (through its yt-dlp hook), so nothing
//   here downloads or decodes audio
// - pause/resume go over mpv's JSON IPC socket
// - a watcher task owns the child process and reports when it exits
//
// Every play() bumps a generation counter. The watcher only touches shared
// state and only reports Ended for its own generation, so an old process
// exiting late can't clobber the track that replaced it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::PlayerError;
use crate::player::backend::{PlaybackState, PlayerBackend, PlayerEvent};
use crate::youtube::search::SearchResult;

const SOCKET_POLL: Duration = Duration::from_millis(100);

// State shared between the backend and the current watcher task
#[derive(Debug)]
struct Shared {
    generation: u64,
    state: PlaybackState,
}

type SharedState = Arc<Mutex<Shared>>;

fn with_shared<R>(shared: &SharedState, f: impl FnOnce(&mut Shared) -> R) -> R {
    let mut guard = shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut guard)
}

struct RunningProcess {
    kill: oneshot::Sender<()>,
    watcher: JoinHandle<()>,
}

pub struct MpvBackend {
    command: String,
    audio_only: bool,
    socket_path: PathBuf,
    events: mpsc::UnboundedSender<PlayerEvent>,
    shared: SharedState,
    loaded: Option<SearchResult>,
    running: Option<RunningProcess>,
}

impl MpvBackend {
    pub fn new(
        command: impl Into<String>,
        audio_only: bool,
        events: mpsc::UnboundedSender<PlayerEvent>,
    ) -> Self {
        let socket_path =
            std::env::temp_dir().join(format!("crusty-queue-{}.sock", std::process::id()));

        MpvBackend {
            command: command.into(),
            audio_only,
            socket_path,
            events,
            shared: Arc::new(Mutex::new(Shared {
                generation: 0,
                state: PlaybackState::Idle,
            })),
            loaded: None,
            running: None,
        }
    }

    async fn stop_process(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.kill.send(());
            if let Err(e) = running.watcher.await {
                warn!("player watcher ended abnormally: {}", e);
            }
        }
    }

    async fn set_paused(&self, paused: bool) -> Result<(), PlayerError> {
        send_ipc(&self.socket_path, &pause_command(paused)).await
    }
}

#[async_trait]
impl PlayerBackend for MpvBackend {
    async fn play(&mut self, item: &SearchResult) -> Result<(), PlayerError> {
        self.stop_process().await;

        // A leftover socket would make the new process look ready immediately
        let _ = std::fs::remove_file(&self.socket_path);

        let args = build_args(self.audio_only, &self.socket_path, &item.watch_url());
        let spawned = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        let child = match spawned {
            Ok(child) => child,
            Err(source) => {
                // The previous process is already gone. Bump the generation
                // so an Ended it queued before dying is treated as stale.
                with_shared(&self.shared, |s| {
                    s.generation += 1;
                    s.state = PlaybackState::Idle;
                });
                self.loaded = None;
                return Err(PlayerError::Spawn {
                    command: self.command.clone(),
                    source,
                });
            }
        };

        let generation = with_shared(&self.shared, |s| {
            s.generation += 1;
            s.state = PlaybackState::Buffering;
            s.generation
        });
        self.loaded = Some(item.clone());

        let (kill_tx, kill_rx) = oneshot::channel();
        let watcher = tokio::spawn(watch_process(
            child,
            kill_rx,
            Arc::clone(&self.shared),
            self.socket_path.clone(),
            self.events.clone(),
            generation,
        ));
        self.running = Some(RunningProcess {
            kill: kill_tx,
            watcher,
        });

        info!(id = %item.id, title = %item.title, generation, "player started");
        Ok(())
    }

    async fn cue(&mut self, item: &SearchResult) -> Result<(), PlayerError> {
        self.stop_process().await;
        with_shared(&self.shared, |s| s.state = PlaybackState::Cued);
        self.loaded = Some(item.clone());
        debug!(id = %item.id, "track cued");
        Ok(())
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        // While Buffering mpv has no IPC socket yet, so there is nothing to talk to
        match self.state() {
            PlaybackState::Playing => {
                self.set_paused(true).await?;
                with_shared(&self.shared, |s| s.state = PlaybackState::Paused);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn resume(&mut self) -> Result<(), PlayerError> {
        match self.state() {
            PlaybackState::Paused => {
                self.set_paused(false).await?;
                with_shared(&self.shared, |s| s.state = PlaybackState::Playing);
                Ok(())
            }
            PlaybackState::Cued | PlaybackState::Ended | PlaybackState::Idle => {
                let item = self.loaded.clone().ok_or(PlayerError::NothingLoaded)?;
                self.play(&item).await
            }
            PlaybackState::Playing | PlaybackState::Buffering => Ok(()),
        }
    }

    async fn stop(&mut self) {
        self.stop_process().await;
        with_shared(&self.shared, |s| s.state = PlaybackState::Idle);
        let _ = std::fs::remove_file(&self.socket_path);
    }

    fn state(&self) -> PlaybackState {
        with_shared(&self.shared, |s| s.state)
    }

    fn generation(&self) -> u64 {
        with_shared(&self.shared, |s| s.generation)
    }

    fn loaded(&self) -> Option<&SearchResult> {
        self.loaded.as_ref()
    }
}

impl Drop for MpvBackend {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.kill.send(());
        }
    }
}

async fn watch_process(
    mut child: Child,
    mut kill: oneshot::Receiver<()>,
    shared: SharedState,
    socket: PathBuf,
    events: mpsc::UnboundedSender<PlayerEvent>,
    generation: u64,
) {
    let mut poll = tokio::time::interval(SOCKET_POLL);
    let mut buffering = true;

    loop {
        tokio::select! {
            status = child.wait() => {
                debug!(?status, generation, "player process exited");
                let current = with_shared(&shared, |s| {
                    if s.generation == generation {
                        s.state = PlaybackState::Ended;
                        true
                    } else {
                        false
                    }
                });
                if current {
                    let _ = events.send(PlayerEvent::Ended { generation });
                }
                return;
            }
            _ = &mut kill => {
                if let Err(e) = child.kill().await {
                    warn!("failed to kill player process: {}", e);
                }
                return;
            }
            _ = poll.tick(), if buffering => {
                if tokio::fs::metadata(&socket).await.is_ok() {
                    buffering = false;
                    with_shared(&shared, |s| {
                        if s.generation == generation && s.state == PlaybackState::Buffering {
                            s.state = PlaybackState::Playing;
                        }
                    });
                }
            }
        }
    }
}

/// mpv command line for one track.
pub fn build_args(audio_only: bool, socket: &Path, url: &str) -> Vec<String> {
    let mut args = Vec::new();
    if audio_only {
        args.push("--no-video".to_string());
    }
    // mpv must not grab the terminal the TUI is drawing on
    args.push("--no-terminal".to_string());
    args.push("--force-window=no".to_string());
    args.push("--ytdl-format=bestaudio/best".to_string());
    args.push(format!("--input-ipc-server={}", socket.display()));
    args.push(url.to_string());
    args
}

pub fn pause_command(paused: bool) -> serde_json::Value {
    serde_json::json!({ "command": ["set_property", "pause", paused] })
}

#[cfg(unix)]
async fn send_ipc(socket: &Path, payload: &serde_json::Value) -> Result<(), PlayerError> {
    use tokio::io::AsyncWriteExt;

    let mut stream = tokio::net::UnixStream::connect(socket).await?;
    let mut line = payload.to_string();
    line.push('\n');
    stream.write_all(line.as_bytes()).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn send_ipc(_socket: &Path, _payload: &serde_json::Value) -> Result<(), PlayerError> {
    Err(PlayerError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_only_args() {
        let args = build_args(true, Path::new("/tmp/p.sock"), "https://www.youtube.com/watch?v=x");
        assert_eq!(args[0], "--no-video");
        assert!(args.contains(&"--no-terminal".to_string()));
        assert!(args.contains(&"--input-ipc-server=/tmp/p.sock".to_string()));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=x");
    }

    #[test]
    fn video_args_keep_the_window() {
        let args = build_args(false, Path::new("/tmp/p.sock"), "u");
        assert!(!args.contains(&"--no-video".to_string()));
    }

    #[test]
    fn pause_command_shape() {
        assert_eq!(
            pause_command(true).to_string(),
            r#"{"command":["set_property","pause",true]}"#
        );
    }

    #[tokio::test]
    async fn cue_loads_without_a_process() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut backend = MpvBackend::new("mpv", true, tx);
        let item = SearchResult::new("id1", "Song", "");

        backend.cue(&item).await.unwrap();
        assert_eq!(backend.state(), PlaybackState::Cued);
        assert_eq!(backend.loaded(), Some(&item));
        assert_eq!(backend.generation(), 0);
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut backend = MpvBackend::new("crusty-queue-no-such-player", true, tx);
        let err = backend
            .play(&SearchResult::new("id1", "Song", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, PlayerError::Spawn { .. }));
        assert_eq!(backend.state(), PlaybackState::Idle);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_play_after_a_running_track_goes_idle() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut backend = MpvBackend::new("sleep", true, tx);
        backend.socket_path = std::env::temp_dir().join("crusty-queue-failed-play.sock");

        backend.play(&SearchResult::new("a", "Song A", "")).await.unwrap();
        assert_eq!(backend.generation(), 1);
        assert!(backend.running.is_some());

        backend.command = "crusty-queue-no-such-player".to_string();
        let err = backend
            .play(&SearchResult::new("b", "Song B", ""))
            .await
            .unwrap_err();

        assert!(matches!(err, PlayerError::Spawn { .. }));
        assert_eq!(backend.state(), PlaybackState::Idle);
        assert_eq!(backend.loaded(), None);
        assert!(backend.running.is_none());
        assert_eq!(backend.generation(), 2);
    }

    #[tokio::test]
    async fn pause_while_buffering_is_a_no_op() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut backend = MpvBackend::new("mpv", true, tx);
        backend.socket_path = std::env::temp_dir().join("crusty-queue-no-socket-here.sock");
        with_shared(&backend.shared, |s| s.state = PlaybackState::Buffering);

        backend.pause().await.unwrap();
        assert_eq!(backend.state(), PlaybackState::Buffering);
    }

    #[tokio::test]
    async fn resume_with_nothing_loaded_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut backend = MpvBackend::new("mpv", true, tx);
        assert!(matches!(
            backend.resume().await,
            Err(PlayerError::NothingLoaded)
        ));
    }
}
