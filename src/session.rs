// One player session: the queue, the debouncer and the player, plus the bits
// of UI state that depend on them (loading flag, transient notice, pending
// auto-advance).
//
// Everything here runs on the UI task. Search results and player events come
// in through `handle_search` / `handle_player`; the UI loop calls `tick`
// every frame so time-based work (auto-advance, notice expiry) happens
// without blocking on a sleep.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::PlayerError;
use crate::player::backend::{PlaybackState, PlayerBackend, PlayerEvent};
use crate::player::debounce::{QueryDebouncer, SearchEvent, Submission};
use crate::player::queue::Queue;
use crate::youtube::search::SearchResult;

const AUDIO_ONLY_NOTICE: Duration = Duration::from_secs(4);
const LOCAL_MODE_NOTICE: Duration = Duration::from_secs(10);
const ERROR_NOTICE: Duration = Duration::from_secs(5);

pub const SEARCH_FAILED_MESSAGE: &str = "Failed to load. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    expires_at: Instant,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>, ttl: Duration) -> Self {
        Notice {
            kind,
            message: message.into(),
            expires_at: Instant::now() + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub advance_delay: Duration,
    /// Shows the one-time "audio only" notice on first playback.
    pub audio_only: bool,
    pub fallback: Vec<SearchResult>,
}

pub struct Session {
    queue: Queue,
    debouncer: QueryDebouncer,
    player: Box<dyn PlayerBackend>,
    options: SessionOptions,
    // Owned here rather than derived from the queue index: a session can
    // start at any entry.
    first_playback_done: bool,
    loading: bool,
    notice: Option<Notice>,
    advance_at: Option<Instant>,
}

impl Session {
    pub fn new(debouncer: QueryDebouncer, player: Box<dyn PlayerBackend>, options: SessionOptions) -> Self {
        Session {
            queue: Queue::new(),
            debouncer,
            player,
            options,
            first_playback_done: false,
            loading: false,
            notice: None,
            advance_at: None,
        }
    }

    pub fn submit_query(&mut self, query: &str) -> Submission {
        self.debouncer.submit(query)
    }

    pub async fn handle_search(&mut self, event: SearchEvent) {
        match event {
            SearchEvent::Loading { query } => {
                debug!(query = %query, "search scheduled");
                self.loading = true;
            }
            SearchEvent::Completed { query, outcome } => {
                self.loading = false;
                match outcome {
                    Ok(items) => {
                        info!(query = %query, count = items.len(), "search results");
                        let first = items.first().cloned();
                        self.queue.replace(items);
                        if let Some(first) = first {
                            self.cue_if_idle(first).await;
                        }
                    }
                    Err(e) => {
                        warn!(query = %query, error = %e, "search failed, showing samples");
                        self.set_notice(NoticeKind::Error, SEARCH_FAILED_MESSAGE, ERROR_NOTICE);
                        self.queue.replace(self.options.fallback.clone());
                    }
                }
            }
        }
    }

    // A fresh result list only gets its first entry cued when nothing is
    // playing, so a search never cuts off the current track. The queue index
    // is left alone: cueing is not navigation.
    async fn cue_if_idle(&mut self, first: SearchResult) {
        if !matches!(
            self.player.state(),
            PlaybackState::Idle | PlaybackState::Cued | PlaybackState::Ended
        ) {
            return;
        }

        if let Err(e) = self.player.cue(&first).await {
            warn!(error = %e, "failed to cue first result");
        }
    }

    /// Local mode: put the sample songs up and cue the first one.
    pub async fn load_offline_samples(&mut self) {
        let samples = self.options.fallback.clone();
        let first = samples.first().cloned();
        self.queue.replace(samples);
        if let Some(first) = first {
            self.cue_if_idle(first).await;
        }
        self.set_notice(
            NoticeKind::Info,
            "Local mode: using sample songs, no network searches",
            LOCAL_MODE_NOTICE,
        );
    }

    pub async fn play_by_id(&mut self, id: &str) -> Option<SearchResult> {
        let index = self.queue.select_by_id(id)?;
        let item = self.queue.get(index)?.clone();
        self.start(&item).await;
        Some(item)
    }

    pub async fn play_next(&mut self) -> Option<SearchResult> {
        let item = self.queue.next()?;
        self.start(&item).await;
        Some(item)
    }

    pub async fn play_previous(&mut self) -> Option<SearchResult> {
        let item = self.queue.previous()?;
        self.start(&item).await;
        Some(item)
    }

    // Starts the track the player has cued and moves the selection onto it
    async fn play_cued(&mut self) -> Option<SearchResult> {
        if self.player.state() != PlaybackState::Cued {
            return None;
        }
        let id = self.player.loaded()?.id.clone();
        self.play_by_id(&id).await
    }

    async fn start(&mut self, item: &SearchResult) {
        self.advance_at = None;

        match self.player.play(item).await {
            Ok(()) => {
                info!(id = %item.id, title = %item.title, "now playing");
                if !self.first_playback_done {
                    self.first_playback_done = true;
                    if self.options.audio_only {
                        self.set_notice(
                            NoticeKind::Info,
                            "Audio-only mode: music plays without video",
                            AUDIO_ONLY_NOTICE,
                        );
                    }
                }
            }
            Err(e) => {
                warn!(id = %item.id, error = %e, "playback failed");
                self.set_notice(NoticeKind::Error, format!("Playback failed: {}", e), ERROR_NOTICE);
            }
        }
    }

    pub async fn toggle_playback(&mut self) {
        let result: Result<(), PlayerError> = match self.player.state() {
            PlaybackState::Playing | PlaybackState::Buffering => self.player.pause().await,
            PlaybackState::Cued => match self.play_cued().await {
                Some(_) => Ok(()),
                None => self.player.resume().await,
            },
            PlaybackState::Paused => self.player.resume().await,
            PlaybackState::Idle | PlaybackState::Ended => Ok(()),
        };

        if let Err(e) = result {
            warn!(error = %e, "toggle playback failed");
            self.set_notice(NoticeKind::Error, format!("Player error: {}", e), ERROR_NOTICE);
        }
    }

    pub fn handle_player(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Ended { generation } if generation == self.player.generation() => {
                debug!(generation, "track ended, advancing");
                self.advance_at = Some(Instant::now() + self.options.advance_delay);
            }
            PlayerEvent::Ended { generation } => {
                debug!(generation, "ignoring end of a replaced track");
            }
        }
    }

    /// Runs due timed work. Call once per UI frame.
    pub async fn tick(&mut self) {
        if self.notice.as_ref().map_or(false, Notice::is_expired) {
            self.notice = None;
        }

        if let Some(at) = self.advance_at {
            if Instant::now() >= at {
                self.advance_at = None;
                // Results that arrived during the wait cued their first entry
                if self.play_cued().await.is_none() {
                    self.play_next().await;
                }
            }
        }
    }

    fn set_notice(&mut self, kind: NoticeKind, message: impl Into<String>, ttl: Duration) {
        self.notice = Some(Notice::new(kind, message, ttl));
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| !n.is_expired())
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_advance_pending(&self) -> bool {
        self.advance_at.is_some()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.player.state()
    }

    pub fn now_playing(&self) -> Option<&SearchResult> {
        self.player.loaded()
    }

    /// Tears the session down: no search fires afterwards and the player
    /// process is gone.
    pub async fn shutdown(mut self) {
        self.debouncer.cancel();
        self.player.stop().await;
        info!("session closed");
    }
}
