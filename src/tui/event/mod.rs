//! Event handling for the TUI.
//!
//! Merges terminal input, session events, and a periodic tick into one
//! stream consumed by the app loop.

use crate::client::SessionEnvelope;
use crate::tui::app::App;
use crossterm::event::{Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Application-level event variants.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize(u16, u16),
    /// A session task reported something.
    Session(SessionEnvelope),
    /// Periodic tick for UI refresh.
    Tick,
}

/// Event handler that merges terminal input, session events, and ticks.
pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    /// Creates a new EventHandler with the specified tick rate.
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    /// Waits for the next event.
    ///
    /// Uses `tokio::select!` to race crossterm input, the session event
    /// channel, and the tick timer.
    pub async fn next(
        &self,
        reader: &mut EventStream,
        session_events: &mut mpsc::Receiver<SessionEnvelope>,
    ) -> std::io::Result<Event> {
        let mut tick = interval(self.tick_rate);
        // Consume the first immediate tick
        tick.tick().await;

        loop {
            tokio::select! {
                maybe_event = reader.next() => {
                    match maybe_event {
                        Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            return Ok(Event::Key(key))
                        }
                        Some(Ok(CrosstermEvent::Resize(w, h))) => return Ok(Event::Resize(w, h)),
                        Some(Err(e)) => return Err(e),
                        // Ignore key releases, mouse, focus, paste events
                        Some(Ok(_)) => continue,
                        None => return Err(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "event stream ended",
                        )),
                    }
                }
                Some(envelope) = session_events.recv() => {
                    return Ok(Event::Session(envelope));
                }
                _ = tick.tick() => {
                    return Ok(Event::Tick);
                }
            }
        }
    }
}

/// Action produced by handling a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No action to take.
    None,
    /// Quit the application.
    Quit,
    /// Start a session.
    Connect,
    /// End the session.
    Disconnect,
}

/// Maps a key press to an action.
///
/// `c` and `d` only produce an action while the matching control is enabled,
/// so pressing a disabled control does nothing.
pub fn handle_key_event(app: &App, key: KeyEvent) -> Action {
    if should_quit(key) {
        return Action::Quit;
    }

    let controls = app.dashboard.controls();
    match key.code {
        KeyCode::Char('c') if controls.connect_enabled => Action::Connect,
        KeyCode::Char('d') if controls.disconnect_enabled => Action::Disconnect,
        _ => Action::None,
    }
}

/// Returns `true` for `q`, `Esc`, and `Ctrl-C`.
pub fn should_quit(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
