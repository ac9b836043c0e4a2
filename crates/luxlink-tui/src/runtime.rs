//! Async runtime.
//!
//! Event loop that drives terminal I/O and coordinates between the shell
//! state machines, the controller tasks, and the bridge client. Uses
//! `tokio::select!` to multiplex terminal events, controller messages, and
//! the 100ms batch tick; all UI state is owned here, so state mutation never
//! races a network task.

use std::{
    fs,
    io::{self, Stdout, stdout},
    path::PathBuf,
    time::Instant,
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use luxlink_app::{
    BATCH_INTERVAL, Command, CommandError, KeyInput, LogTailState, LogViewState, ModeAction,
    ShellMode, ShellState, WatchState,
    events::EventsState,
    view::REFRESH_INTERVAL,
};
use luxlink_client::{BridgeClient, ClientError, LogEntry};
use luxlink_config::{ConfigError, ConsoleConfig};
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    handlers,
    input::{InputEvent, InputState},
    keys::convert_key,
    tasks::{self, ControllerEvent, StreamConfig, StreamHandle, StreamId, WatchHandle},
    ui,
};

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bridge client failure during startup.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Config load/save failure during startup.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Async runtime for the console.
///
/// Owns the terminal, all shell state, and the handles of whatever
/// controller tasks the active mode needs.
pub struct Runtime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    shell: ShellState,
    input: InputState,
    client: BridgeClient,
    config: ConsoleConfig,
    config_path: PathBuf,
    history_path: PathBuf,
    events_tx: mpsc::Sender<ControllerEvent>,
    events_rx: Option<mpsc::Receiver<ControllerEvent>>,
    tail_handle: Option<StreamHandle>,
    events_handle: Option<StreamHandle>,
    watch_handle: Option<WatchHandle>,
    next_view_refresh: Option<Instant>,
    status_inflight: bool,
    should_quit: bool,
    dirty: bool,
    ticks: u64,
}

impl Runtime {
    /// Set up the terminal and construct the runtime.
    pub fn new(
        client: BridgeClient,
        config: ConsoleConfig,
        config_path: PathBuf,
        history_path: PathBuf,
    ) -> Result<Self, RuntimeError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        let mut shell = ShellState::new(client.base_url().to_string());
        if let Ok((cols, rows)) = crossterm::terminal::size() {
            shell.terminal_size = (cols, rows);
        }

        let mut input = InputState::new(config.shell.history_size);
        if let Ok(persisted) = fs::read_to_string(&history_path) {
            input.load_history(persisted.lines().map(ToString::to_string));
        }

        let (events_tx, events_rx) = mpsc::channel(256);

        Ok(Self {
            terminal,
            shell,
            input,
            client,
            config,
            config_path,
            history_path,
            events_tx,
            events_rx: Some(events_rx),
            tail_handle: None,
            events_handle: None,
            watch_handle: None,
            next_view_refresh: None,
            status_inflight: false,
            should_quit: false,
            dirty: false,
            ticks: 0,
        })
    }

    /// Run the main event loop until the user exits.
    pub async fn run(mut self) -> Result<(), RuntimeError> {
        let Some(mut controller_events) = self.events_rx.take() else {
            return Ok(());
        };
        let mut terminal_events = EventStream::new();
        let mut tick = tokio::time::interval(BATCH_INTERVAL);

        self.shell.append_output(&format!(
            "Connected to {}\nType 'help' for available commands.\n\n",
            self.shell.server_url
        ));
        self.render()?;

        while !self.should_quit {
            tokio::select! {
                maybe_event = terminal_events.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_terminal_event(event).await?,
                    Some(Err(error)) => return Err(RuntimeError::Io(error)),
                    None => break,
                },
                Some(event) = controller_events.recv() => self.handle_controller_event(event),
                _ = tick.tick() => self.handle_tick(),
            }

            if self.dirty {
                self.render()?;
                self.dirty = false;
            }
        }

        self.shutdown().await;
        Ok(())
    }

    fn render(&mut self) -> Result<(), RuntimeError> {
        self.terminal.draw(|frame| {
            ui::render(frame, &self.shell, &self.input);
        })?;
        Ok(())
    }

    async fn handle_terminal_event(&mut self, event: Event) -> Result<(), RuntimeError> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if let Some(input) = convert_key(&key) {
                    self.handle_key(input).await;
                }
            },
            Event::Resize(cols, rows) => {
                self.shell.terminal_size = (cols, rows);
                self.dirty = true;
            },
            _ => {},
        }
        Ok(())
    }

    async fn handle_key(&mut self, key: KeyInput) {
        if key == KeyInput::Ctrl('d') {
            self.should_quit = true;
            return;
        }

        if self.shell.mode.is_normal() {
            self.handle_normal_key(key).await;
            return;
        }

        let actions = self.shell.handle_mode_key(key);
        for action in actions {
            match action {
                ModeAction::Render => {},
                ModeAction::ExitMode => self.exit_mode().await,
                ModeAction::FetchPage => self.start_view_fetch(),
                ModeAction::SetWatchInterval(interval) => {
                    if let Some(watch) = &self.watch_handle {
                        watch.set_interval(interval).await;
                    }
                },
                ModeAction::UpdateTailFilters(filters) => {
                    if let Some(tail) = &self.tail_handle {
                        tail.set_filters(filters).await;
                    }
                },
            }
            self.dirty = true;
        }
    }

    async fn handle_normal_key(&mut self, key: KeyInput) {
        match key {
            KeyInput::Ctrl('c') => {
                if !self.input.clear_line() {
                    self.shell.append_output("Use 'exit' or Ctrl-D to quit.\n");
                }
                self.dirty = true;
            },
            KeyInput::Ctrl('l') => {
                self.shell.output.clear();
                self.dirty = true;
            },
            KeyInput::Ctrl('t') => {
                let follow = !self.shell.output.follow_tail();
                self.shell.output.set_follow_tail(follow);
                let status = if follow { "enabled" } else { "disabled" };
                self.shell.append_output(&format!("Follow-tail {status}\n"));
                self.dirty = true;
            },
            KeyInput::PageUp => {
                self.shell.scroll_output(true);
                self.dirty = true;
            },
            KeyInput::PageDown => {
                self.shell.scroll_output(false);
                self.dirty = true;
            },
            other => match self.input.handle_key(other) {
                InputEvent::Submit(line) => {
                    self.dispatch_line(&line).await;
                    self.dirty = true;
                },
                InputEvent::Redraw => self.dirty = true,
                InputEvent::None => {},
            },
        }
    }

    fn handle_tick(&mut self) {
        self.ticks += 1;

        // Batched stream flushes: one append + one redraw per tick at most.
        match &mut self.shell.mode {
            ShellMode::LogTail(tail) => {
                if tail.flush() {
                    self.dirty = true;
                }
            },
            ShellMode::Events(events) => {
                if events.flush() {
                    self.dirty = true;
                }
            },
            _ => {},
        }

        // Log view auto-refresh.
        if let Some(due) = self.next_view_refresh
            && Instant::now() >= due
        {
            if matches!(self.shell.mode, ShellMode::LogView(_)) {
                self.start_view_fetch();
                self.next_view_refresh = Some(Instant::now() + REFRESH_INTERVAL);
            } else {
                self.next_view_refresh = None;
            }
        }

        // Lazy toolbar refresh, at most one in flight.
        if !self.status_inflight && self.shell.toolbar.is_stale(Instant::now()) {
            self.status_inflight = true;
            tasks::spawn_status_refresh(self.client.clone(), self.events_tx.clone());
        }

        // The toolbar's "Updated Ns ago" needs an occasional repaint even
        // when nothing else happens.
        if self.ticks % 10 == 0 {
            self.dirty = true;
        }
    }

    fn handle_controller_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::StreamState { id, state } => {
                match (id, &mut self.shell.mode) {
                    (StreamId::LogTail, ShellMode::LogTail(tail)) => tail.connection = state,
                    (StreamId::Events, ShellMode::Events(events)) => events.connection = state,
                    _ => {},
                }
                self.dirty = true;
            },
            ControllerEvent::StreamMessage { id, payload } => {
                let width = self.shell.width();
                match id {
                    StreamId::LogTail => {
                        if let Some(tail) = self.shell.mode.as_log_tail_mut() {
                            match serde_json::from_value::<LogEntry>(payload) {
                                Ok(entry) => tail.push_entry(&entry, width),
                                Err(error) => {
                                    tracing::debug!(%error, "skipping malformed log entry");
                                },
                            }
                        }
                    },
                    StreamId::Events => {
                        if let Some(events) = self.shell.mode.as_events_mut() {
                            match serde_json::from_value(payload) {
                                Ok(event) => events.push_event(&event),
                                Err(error) => {
                                    tracing::debug!(%error, "skipping malformed event");
                                },
                            }
                        }
                    },
                }
                // No redraw here: the batch tick flushes and redraws.
            },
            ControllerEvent::WatchRendered { text } => {
                if let Some(watch) = self.shell.mode.as_watch_mut() {
                    watch.show(text);
                    self.dirty = true;
                }
            },
            ControllerEvent::ViewFetched { generation, outcome } => {
                if let Some(view) = self.shell.mode.as_log_view_mut() {
                    if view.apply_fetch(generation, outcome) {
                        self.start_view_fetch();
                    }
                    self.dirty = true;
                }
            },
            ControllerEvent::StatusFetched { health, devices } => {
                if let Some(health) = health {
                    self.shell.toolbar.apply_health(health);
                }
                if let Some(devices) = devices {
                    self.shell.toolbar.apply_devices(&devices);
                }
                self.shell.toolbar.mark_updated(Instant::now());
                self.status_inflight = false;
                self.dirty = true;
            },
        }
    }

    fn start_view_fetch(&mut self) {
        if let Some(view) = self.shell.mode.as_log_view_mut() {
            let (generation, query) = view.begin_fetch();
            tasks::spawn_view_fetch(self.client.clone(), generation, query, self.events_tx.clone());
        }
    }

    async fn dispatch_line(&mut self, line: &str) {
        let command = match luxlink_app::command::parse(line) {
            Ok(command) => command,
            Err(CommandError::Empty) => return,
            Err(error) => {
                self.shell.append_error(&error.to_string());
                return;
            },
        };

        let width = self.shell.width().max(40);
        match command {
            Command::Help(topic) => {
                let text = handlers::system::help_text(topic.as_deref());
                self.shell.append_output(&text);
            },
            Command::Clear => self.shell.output.clear(),
            Command::Exit => self.should_quit = true,
            Command::Health => {
                let result = handlers::system::render_health(&self.client).await;
                self.report(result);
            },
            Command::Status | Command::MonitorStats => {
                let format = self.config.shell.default_output_format.clone();
                let result = handlers::monitoring::render_stats(&self.client, &format).await;
                self.report(result);
            },
            Command::Reload => {
                let result = handlers::system::render_reload(&self.client).await;
                self.report(result);
            },
            Command::DevicesList => {
                let result = handlers::devices::render_list(&self.client, width).await;
                self.report(result);
            },
            Command::DeviceShow(id) => {
                let result = handlers::devices::render_show(&self.client, &id).await;
                self.report(result);
            },
            Command::DeviceEnable(id) => {
                let result = handlers::devices::set_enabled(&self.client, &id, true).await;
                self.report(result);
            },
            Command::DeviceDisable(id) => {
                let result = handlers::devices::set_enabled(&self.client, &id, false).await;
                self.report(result);
            },
            Command::DeviceTest(id, payload) => {
                let result =
                    handlers::devices::send_test(&self.client, &id, payload.as_deref()).await;
                self.report(result);
            },
            Command::DeviceCommand(id, body) => {
                let result = handlers::devices::send_command(&self.client, &id, &body).await;
                self.report(result);
            },
            Command::MappingsList => {
                let result = handlers::mappings::render_list(&self.client, width).await;
                self.report(result);
            },
            Command::MappingShow(id) => {
                let result = handlers::mappings::render_show(&self.client, id).await;
                self.report(result);
            },
            Command::MappingDelete(id) => {
                let result = handlers::mappings::delete(&self.client, id).await;
                self.report(result);
            },
            Command::ChannelsList(universes) => {
                let result =
                    handlers::monitoring::render_channels(&self.client, &universes, width).await;
                self.report(result);
            },
            Command::MonitorDashboard => {
                let result = handlers::monitoring::render_dashboard(&self.client, width).await;
                self.report(result);
            },
            Command::MonitorDevices => {
                let result = handlers::monitoring::render_devices(&self.client, width).await;
                self.report(result);
            },
            Command::LogsView { level, logger } => self.enter_log_view(level, logger, None),
            Command::LogsSearch { pattern, regex, level, logger } => {
                self.enter_log_view(level, logger, Some((pattern, regex)));
            },
            Command::LogsTail { level, logger } => self.enter_log_tail(level, logger),
            Command::LogsEvents(kind) => self.enter_events(kind),
            Command::Watch { target, interval } => self.enter_watch(target, interval),
            Command::ProfileList => {
                let text = handlers::system::render_profiles(&self.config);
                self.shell.append_output(&text);
            },
            Command::ProfileUse(name) => self.switch_profile(&name),
        }
    }

    fn report(&mut self, result: Result<String, ClientError>) {
        match result {
            Ok(text) => self.shell.append_output(&text),
            Err(error) => self.shell.append_error(&error.to_string()),
        }
    }

    fn enter_log_view(
        &mut self,
        level: Option<luxlink_app::LogLevel>,
        logger: Option<String>,
        search: Option<(String, bool)>,
    ) {
        let mut view = LogViewState::new(level, logger, search);
        view.logs_per_page = LogViewState::page_size_for(self.shell.terminal_size.1);
        self.shell.mode = ShellMode::LogView(view);
        self.start_view_fetch();
        self.next_view_refresh = Some(Instant::now() + REFRESH_INTERVAL);
    }

    fn enter_log_tail(&mut self, level: Option<String>, logger: Option<String>) {
        let state = LogTailState::new(level, logger);
        let config = StreamConfig {
            url: self.client.logs_stream_url(None, None),
            api_key: self.client.api_key().map(ToString::to_string),
            initial_payload: state.initial_payload(),
        };
        self.tail_handle =
            Some(tasks::spawn_stream(StreamId::LogTail, config, self.events_tx.clone()));
        self.shell.mode = ShellMode::LogTail(state);
    }

    fn enter_events(&mut self, kind: Option<luxlink_app::EventKindFilter>) {
        let state = EventsState::new(kind);
        let config = StreamConfig {
            url: self.client.events_stream_url(),
            api_key: self.client.api_key().map(ToString::to_string),
            initial_payload: None,
        };
        self.events_handle =
            Some(tasks::spawn_stream(StreamId::Events, config, self.events_tx.clone()));
        self.shell.mode = ShellMode::Events(state);
    }

    fn enter_watch(&mut self, target: luxlink_app::WatchTarget, interval: Option<std::time::Duration>) {
        // The configured refresh interval is the default; an explicit
        // argument wins.
        let interval = interval.or_else(|| {
            let seconds = self.config.shell.auto_refresh_interval;
            (seconds.is_finite() && seconds > 0.0)
                .then(|| std::time::Duration::from_secs_f64(seconds))
        });
        let state = WatchState::new(target, interval);
        let width = self.shell.width().max(40);
        self.watch_handle = Some(tasks::spawn_watch(
            self.client.clone(),
            state.target,
            state.interval,
            width,
            self.events_tx.clone(),
        ));
        self.shell.mode = ShellMode::Watch(state);
    }

    fn switch_profile(&mut self, name: &str) {
        let Some(profile) = self.config.servers.get(name).cloned() else {
            self.shell.append_error(&format!("no such profile: {name}"));
            return;
        };
        let api_key = self.config.api_key_for(name);
        match BridgeClient::new(&profile.url, api_key) {
            Ok(client) => {
                self.client = client;
                self.config.active_server = name.to_string();
                self.shell.server_url = profile.url.clone();
                if let Err(error) = self.config.save(&self.config_path) {
                    self.shell.append_error(&format!("profile saved in memory only: {error}"));
                }
                self.shell.append_output(&format!("Switched to profile {name} ({})\n", profile.url));
            },
            Err(error) => self.shell.append_error(&error.to_string()),
        }
    }

    /// Stop the active controller (tasks cancelled and awaited, sockets
    /// closed) and return to normal mode. The mode flag only flips after
    /// everything settled, so re-entry can never race a dying task.
    async fn exit_mode(&mut self) {
        if let Some(handle) = self.tail_handle.take() {
            handle.stop().await;
        }
        if let Some(handle) = self.events_handle.take() {
            handle.stop().await;
        }
        if let Some(handle) = self.watch_handle.take() {
            handle.stop().await;
        }
        self.next_view_refresh = None;
        self.shell.mode = ShellMode::Normal;
        self.dirty = true;
    }

    async fn shutdown(&mut self) {
        self.exit_mode().await;
        self.save_history();
    }

    fn save_history(&self) {
        if let Some(parent) = self.history_path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let mut text = self.input.history().join("\n");
        text.push('\n');
        if let Err(error) = fs::write(&self.history_path, text) {
            tracing::warn!(%error, "failed to persist command history");
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}
