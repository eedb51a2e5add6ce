//! Block Dashboard library
//!
//! A terminal client for a ledger node's STOMP-over-WebSocket notification
//! endpoint. The user connects and disconnects on demand; while connected,
//! blocks and transactions announced by the node are listed as they arrive.
//!
//! Layers, bottom up:
//! - [`stomp`]: STOMP 1.2 frame codec.
//! - [`events`]: the two topics and their validated JSON payloads.
//! - [`client`]: one session per connection, run in its own task.
//! - [`dashboard`]: the UI state machine, free of I/O.
//! - [`tui`] and [`watch`]: the interactive and headless front ends.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod events;
pub mod logging;
pub mod stomp;
pub mod tui;
pub mod watch;

pub use client::{SessionConfig, SessionEnvelope, SessionEvent, SessionHandle};
pub use dashboard::{ConnectionState, DashboardState};
pub use events::{BlockEvent, Topic, TransactionEvent};
