//! STOMP session over a WebSocket transport.
//!
//! A session runs in its own task. The owner talks to it through a
//! [`SessionHandle`] and receives [`SessionEnvelope`]s on an mpsc channel.

mod session;

pub use session::{spawn_session, SessionHandle, Subscription};

use crate::events::{BlockEvent, TransactionEvent};
use crate::stomp::Command;
use std::time::Duration;
use thiserror::Error;

/// Fixed path of the STOMP endpoint on the node.
pub const ENDPOINT_PATH: &str = "/ws";

/// Default heart-beat interval the client offers to send.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(10);

/// Capacity of the bounded session event channel owners should create.
pub const SESSION_EVENT_BUFFER: usize = 256;

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that end a session or reject a request on it.
#[derive(Error, Debug)]
pub enum ClientError {
    /// WebSocket handshake or I/O failure.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server sent an ERROR frame.
    #[error("server error: {message}")]
    Server {
        /// Value of the `message` header, or the frame body.
        message: String,
    },

    /// The server sent something other than CONNECTED in reply to CONNECT.
    #[error("unexpected {0} frame while waiting for CONNECTED")]
    UnexpectedFrame(Command),

    /// The server closed the WebSocket.
    #[error("connection closed by server: {}", reason.as_deref().unwrap_or("no reason given"))]
    ClosedByServer {
        /// Close reason sent by the server, if any.
        reason: Option<String>,
    },

    /// The transport ended without a close handshake.
    #[error("connection closed unexpectedly")]
    ConnectionClosed,

    /// The session task has already exited.
    #[error("session has ended")]
    SessionEnded,

    /// The receiver of session events was dropped.
    #[error("session event receiver dropped")]
    EventsDropped,
}

/// Connection settings for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Full WebSocket URL including [`ENDPOINT_PATH`].
    pub url: String,
    /// Heart-beat interval offered to the server. Zero disables heart-beats.
    pub heartbeat: Duration,
}

impl SessionConfig {
    /// Builds a config for the node at `base_url` (e.g. `ws://127.0.0.1:8080`).
    pub fn for_server(base_url: &str, heartbeat: Duration) -> Self {
        Self {
            url: endpoint_url(base_url),
            heartbeat,
        }
    }

    /// Value for the STOMP `host` header: the authority part of the URL.
    pub fn host(&self) -> &str {
        host_from_url(&self.url)
    }
}

/// Appends [`ENDPOINT_PATH`] to a server base URL.
pub fn endpoint_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), ENDPOINT_PATH)
}

/// Extracts the authority (`host[:port]`) from a URL string.
pub fn host_from_url(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .split(|c: char| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or(without_scheme)
}

/// Something that happened on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server accepted the session (CONNECTED received).
    Connected {
        /// Value of the server's `server` header, if sent.
        server: Option<String>,
    },
    /// A validated block event arrived on the blocks topic.
    Block(BlockEvent),
    /// A validated transaction event arrived on the transactions topic.
    Transaction(TransactionEvent),
    /// The session ended. `reason` is `None` after a requested disconnect.
    Closed {
        /// Description of the failure that ended the session.
        reason: Option<String>,
    },
}

/// A [`SessionEvent`] tagged with the generation of the session that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEnvelope {
    /// Generation of the emitting session.
    pub generation: u64,
    /// The event.
    pub event: SessionEvent,
}
