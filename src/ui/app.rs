// Main TUI application using ratatui
// Handles the terminal interface, user input, and display.
// All session state lives in `Session`; this file only draws it and turns
// key presses into session calls.

use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::seq::SliceRandom;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::Config;
use crate::player::backend::{PlaybackState, PlayerEvent};
use crate::player::debounce::{QueryDebouncer, SearchEvent, SkipReason, Submission};
use crate::player::mpv::MpvBackend;
use crate::session::{NoticeKind, Session, SessionOptions};
use crate::youtube::{self, fallback};

const FRAME_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppMode {
    Normal,
    Searching,
}

pub struct MusicPlayerApp {
    session: Session,
    search_rx: mpsc::UnboundedReceiver<SearchEvent>,
    player_rx: mpsc::UnboundedReceiver<PlayerEvent>,
    offline: bool,
    startup_queries: Vec<String>,
    live_search_min_chars: usize,
    selected_result: usize,
    search_query: String,
    mode: AppMode,
    should_quit: bool,
    status_message: String,
}

impl MusicPlayerApp {
    pub fn new(config: Config) -> Self {
        let (search_tx, search_rx) = mpsc::unbounded_channel();
        let (player_tx, player_rx) = mpsc::unbounded_channel();

        let provider = youtube::provider_for(&config);
        info!(provider = provider.name(), "search provider selected");

        let debouncer = QueryDebouncer::new(provider, config.debounce(), search_tx);
        let player = MpvBackend::new(config.player_command.clone(), config.audio_only, player_tx);
        let session = Session::new(
            debouncer,
            Box::new(player),
            SessionOptions {
                advance_delay: config.advance_delay(),
                audio_only: config.audio_only,
                fallback: fallback::sample_results(),
            },
        );

        MusicPlayerApp {
            session,
            search_rx,
            player_rx,
            offline: config.offline,
            startup_queries: config.startup_queries,
            live_search_min_chars: config.live_search_min_chars,
            selected_result: 0,
            search_query: String::new(),
            mode: AppMode::Normal,
            should_quit: false,
            status_message: String::new(),
        }
    }

    pub async fn run(mut self, startup_query: Option<String>) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, startup_query).await;

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        self.session.shutdown().await;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        startup_query: Option<String>,
    ) -> anyhow::Result<()> {
        self.startup(startup_query).await;

        loop {
            terminal.draw(|f| self.draw_ui(f))?;

            while let Ok(search_event) = self.search_rx.try_recv() {
                let completed = matches!(search_event, SearchEvent::Completed { .. });
                self.session.handle_search(search_event).await;
                if completed {
                    let len = self.session.queue().len();
                    self.selected_result = self
                        .session
                        .queue()
                        .current_index()
                        .filter(|&i| i < len)
                        .unwrap_or(0);
                    self.status_message = format!("Found {} results", self.session.queue().len());
                }
            }

            while let Ok(player_event) = self.player_rx.try_recv() {
                self.session.handle_player(player_event);
            }

            let playing_before = self.session.queue().current_index();
            self.session.tick().await;
            if self.session.queue().current_index() != playing_before {
                self.follow_current();
            }

            if event::poll(FRAME_POLL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_input(key.code).await;
                    }
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    async fn startup(&mut self, startup_query: Option<String>) {
        if self.offline {
            self.session.load_offline_samples().await;
            return;
        }

        let query = startup_query.or_else(|| {
            self.startup_queries
                .choose(&mut rand::thread_rng())
                .cloned()
        });
        if let Some(query) = query {
            debug!(query = %query, "startup search");
            self.submit(&query);
        }
    }

    fn draw_ui(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(5),
            ])
            .split(frame.size());

        // Header
        let title = match self.mode {
            AppMode::Searching => format!("Search: {}_", self.search_query),
            AppMode::Normal if self.session.is_loading() => "Loading songs...".to_string(),
            AppMode::Normal if !self.status_message.is_empty() => self.status_message.clone(),
            AppMode::Normal => {
                "Controls: [/]Search [Enter]Play [n/→]Next [p/←]Prev [Space]Play/Pause [j/k]Navigate [x]Dismiss [q]Quit".to_string()
            }
        };
        let header = Paragraph::new(title)
            .block(Block::default().borders(Borders::ALL).title("YouTube Music Player"));
        frame.render_widget(header, chunks[0]);

        // Results / queue
        let queue = self.session.queue();
        let playing_id = self.session.now_playing().map(|t| t.id.as_str());
        let is_playing = self.session.playback_state() == PlaybackState::Playing;

        let results_block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Results ({})", queue.len()));

        if queue.is_empty() {
            let empty = if self.session.is_loading() {
                "Loading songs..."
            } else {
                "No results found"
            };
            frame.render_widget(Paragraph::new(empty).block(results_block), chunks[1]);
        } else {
            let items: Vec<ListItem> = queue
                .items()
                .iter()
                .enumerate()
                .map(|(i, track)| {
                    let marker = match playing_id {
                        Some(id) if id == track.id && is_playing => "⏸ ",
                        Some(id) if id == track.id => "▶ ",
                        _ => "  ",
                    };
                    let mut style = Style::default();
                    if Some(i) == queue.current_index() {
                        style = style.fg(Color::Green);
                    }
                    if i == self.selected_result {
                        style = style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
                    }
                    ListItem::new(format!("{}{}", marker, track.title)).style(style)
                })
                .collect();

            frame.render_widget(List::new(items).block(results_block), chunks[1]);
        }

        // Player info
        let now_playing = match self.session.now_playing() {
            Some(track) => format!("Now Playing: {}", track.title),
            None => "No track playing".to_string(),
        };
        let position = match queue.current_index() {
            Some(i) if i < queue.len() => format!("{}/{}", i + 1, queue.len()),
            _ => "-".to_string(),
        };
        let mut player_info = format!(
            "{}\nState: {} | Track: {}",
            now_playing,
            self.session.playback_state().label(),
            position
        );

        let mut player_style = Style::default();
        if let Some(notice) = self.session.notice() {
            player_info.push('\n');
            player_info.push_str(&notice.message);
            player_style = match notice.kind {
                NoticeKind::Error => player_style.fg(Color::Red),
                NoticeKind::Info => player_style.fg(Color::Cyan),
            };
        }

        let player_widget = Paragraph::new(player_info)
            .style(player_style)
            .block(Block::default().borders(Borders::ALL).title("Player"));
        frame.render_widget(player_widget, chunks[2]);
    }

    async fn handle_input(&mut self, key: KeyCode) {
        // Clear status message on any key press (except when searching)
        if self.mode != AppMode::Searching {
            self.status_message.clear();
        }

        match self.mode {
            AppMode::Searching => match key {
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                    if self.search_query.trim().chars().count() > self.live_search_min_chars {
                        let query = self.search_query.clone();
                        self.submit(&query);
                    }
                }
                KeyCode::Backspace => {
                    self.search_query.pop();
                }
                KeyCode::Enter => {
                    let query = self.search_query.clone();
                    self.submit(&query);
                    self.mode = AppMode::Normal;
                    self.search_query.clear();
                }
                KeyCode::Esc => {
                    self.mode = AppMode::Normal;
                    self.search_query.clear();
                }
                _ => {}
            },
            AppMode::Normal => match key {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('/') => self.mode = AppMode::Searching,
                KeyCode::Char(' ') => {
                    self.session.toggle_playback().await;
                    self.follow_current();
                }
                KeyCode::Char('n') | KeyCode::Right => {
                    if self.session.play_next().await.is_none() {
                        self.status_message = "Queue is empty!".to_string();
                    }
                    self.follow_current();
                }
                KeyCode::Char('p') | KeyCode::Left => {
                    if self.session.play_previous().await.is_none() {
                        self.status_message = "Queue is empty!".to_string();
                    }
                    self.follow_current();
                }
                KeyCode::Char('j') | KeyCode::Down => self.next_search_result(),
                KeyCode::Char('k') | KeyCode::Up => self.prev_search_result(),
                KeyCode::Enter => self.play_selected().await,
                KeyCode::Char('x') | KeyCode::Esc => self.session.dismiss_notice(),
                _ => {}
            },
        }
    }

    fn submit(&mut self, query: &str) {
        match self.session.submit_query(query) {
            Submission::Scheduled => {}
            Submission::Ignored(SkipReason::InFlight) => {
                self.status_message = "A search is already running...".to_string();
            }
            Submission::Ignored(SkipReason::EmptyQuery) => {}
        }
    }

    async fn play_selected(&mut self) {
        let Some(id) = self
            .session
            .queue()
            .get(self.selected_result)
            .map(|t| t.id.clone())
        else {
            return;
        };

        if let Some(track) = self.session.play_by_id(&id).await {
            self.status_message = format!("Loading: {}...", track.title);
        }
        self.follow_current();
    }

    // Keep the cursor on the track the session just moved to
    fn follow_current(&mut self) {
        if let Some(i) = self.session.queue().current_index() {
            if i < self.session.queue().len() {
                self.selected_result = i;
            }
        }
    }

    fn next_search_result(&mut self) {
        let len = self.session.queue().len();
        if len > 0 {
            self.selected_result = (self.selected_result + 1) % len;
        }
    }

    fn prev_search_result(&mut self) {
        let len = self.session.queue().len();
        if len > 0 {
            if self.selected_result == 0 || self.selected_result >= len {
                self.selected_result = len - 1;
            } else {
                self.selected_result -= 1;
            }
        }
    }
}
