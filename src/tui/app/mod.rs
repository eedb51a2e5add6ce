//! Application state and main event loop for the TUI.
//!
//! Manages terminal setup/teardown, panic hooks, and the core render loop.
//! `App` owns at most one session handle and the dashboard state; every
//! session event and key press is applied here, one at a time.

mod update;

use crate::client::{
    spawn_session, SessionConfig, SessionEnvelope, SessionHandle, Subscription,
    SESSION_EVENT_BUFFER,
};
use crate::dashboard::DashboardState;
use crate::tui::event::{handle_key_event, Action, Event, EventHandler};
use crate::tui::ui::render_dashboard;
use crossterm::{
    event::EventStream,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// How long a status message stays in the footer.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Main application state for the TUI.
#[derive(Debug)]
pub struct App {
    /// Whether the application should exit.
    pub should_quit: bool,
    /// Counter incremented on each tick.
    pub tick_count: u64,
    /// Connection state and the two row lists.
    pub dashboard: DashboardState,
    /// Transient footer message and its expiry.
    pub status_message: Option<(String, Instant)>,
    session_config: SessionConfig,
    session: Option<SessionHandle>,
    subscriptions: Vec<Subscription>,
    next_generation: u64,
    events_tx: mpsc::Sender<SessionEnvelope>,
    events_rx: mpsc::Receiver<SessionEnvelope>,
}

impl App {
    /// Creates a disconnected app. Nothing touches the network until
    /// [`connect`](Self::connect) is called.
    pub fn new(session_config: SessionConfig, max_rows: Option<usize>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(SESSION_EVENT_BUFFER);
        Self {
            should_quit: false,
            tick_count: 0,
            dashboard: DashboardState::new(max_rows),
            status_message: None,
            session_config,
            session: None,
            subscriptions: Vec::new(),
            next_generation: 0,
            events_tx,
            events_rx,
        }
    }

    /// Endpoint URL sessions connect to.
    pub fn endpoint(&self) -> &str {
        &self.session_config.url
    }

    /// Returns `true` while a handle exists but CONNECTED has not arrived.
    pub fn is_connecting(&self) -> bool {
        self.session.is_some() && !self.dashboard.is_connected()
    }

    /// Returns `true` if a session handle is held.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Generation of the live handle, if any.
    pub fn current_generation(&self) -> Option<u64> {
        self.session.as_ref().map(SessionHandle::generation)
    }

    /// Subscriptions registered on the live handle.
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Starts a new session.
    ///
    /// Ignored while connected (the connect control is disabled). A pending
    /// handle that has not yet reached CONNECTED is terminated and replaced.
    pub fn connect(&mut self) {
        if !self.dashboard.controls().connect_enabled {
            tracing::debug!("connect ignored: already connected");
            return;
        }
        if let Some(pending) = self.session.take() {
            tracing::debug!(
                generation = pending.generation(),
                "replacing pending session"
            );
            pending.disconnect();
        }
        self.subscriptions.clear();

        self.next_generation += 1;
        let generation = self.next_generation;
        tracing::info!(generation, url = %self.session_config.url, "connecting");
        self.session = Some(spawn_session(
            self.session_config.clone(),
            generation,
            self.events_tx.clone(),
        ));
        self.set_status(format!("Connecting to {}", self.session_config.url));
    }

    /// Ends the current session, if any, and returns the UI to DISCONNECTED.
    ///
    /// Safe to call in any state; a second call has no further effect.
    pub fn disconnect(&mut self) {
        let subscriptions = std::mem::take(&mut self.subscriptions);
        if let Some(handle) = self.session.take() {
            tracing::info!(generation = handle.generation(), "disconnecting");
            for subscription in &subscriptions {
                if let Err(e) = handle.unsubscribe(subscription) {
                    tracing::debug!(id = subscription.id(), "unsubscribe skipped: {}", e);
                }
            }
            handle.disconnect();
            self.set_status("Disconnected".to_string());
        }
        self.dashboard.mark_disconnected();
    }

    /// Sets the footer status message with the default lifetime.
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now() + STATUS_MESSAGE_TTL));
    }

    /// Clears the status message once its expiry has passed.
    pub fn expire_status_message(&mut self) {
        if let Some((_, expiry)) = &self.status_message {
            if Instant::now() >= *expiry {
                self.status_message = None;
            }
        }
    }

    /// Runs the TUI application: sets up terminal, enters event loop, restores on exit.
    pub async fn run(&mut self, tick_rate: Duration) -> io::Result<()> {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = restore_terminal();
            original_hook(panic_info);
        }));

        setup_terminal()?;

        let result = self.event_loop(tick_rate).await;

        self.disconnect();
        restore_terminal()?;
        result
    }

    async fn event_loop(&mut self, tick_rate: Duration) -> io::Result<()> {
        let backend = CrosstermBackend::new(stdout());
        let mut terminal = Terminal::new(backend)?;
        let event_handler = EventHandler::new(tick_rate);
        let mut reader = EventStream::new();

        terminal.draw(|frame| render_dashboard(frame, self))?;

        while !self.should_quit {
            let event = event_handler.next(&mut reader, &mut self.events_rx).await?;
            match event {
                Event::Key(key) => match handle_key_event(self, key) {
                    Action::Quit => self.should_quit = true,
                    Action::Connect => self.connect(),
                    Action::Disconnect => self.disconnect(),
                    Action::None => {}
                },
                Event::Session(envelope) => self.apply_session_event(envelope),
                Event::Tick => {
                    self.tick_count += 1;
                    self.expire_status_message();
                }
                Event::Resize(_, _) => {}
            }

            if !self.should_quit {
                terminal.draw(|frame| render_dashboard(frame, self))?;
            }
        }
        Ok(())
    }
}

/// Enables raw mode and switches to the alternate screen.
fn setup_terminal() -> io::Result<()> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    Ok(())
}

/// Restores the terminal to its original state.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests;
