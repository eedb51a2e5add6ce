//! STOMP 1.2 frame codec.
//!
//! Pure encoding and decoding; the transport lives in [`crate::client`].

/// Frame model, builders, and encoder.
pub mod frame;

/// Decoder for inbound frames.
pub mod parse;

pub use frame::{Command, Frame};
pub use parse::parse_frames;

use std::time::Duration;
use thiserror::Error;

/// Errors produced while decoding a STOMP frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The command line is not a known STOMP command.
    #[error("unknown STOMP command: {0}")]
    UnknownCommand(String),

    /// A header line has no `:` separator.
    #[error("malformed header line: {0}")]
    MalformedHeader(String),

    /// A header contains an escape sequence STOMP 1.2 does not define.
    #[error("invalid header escape: {0}")]
    InvalidEscape(String),

    /// `content-length` is not a number or points past the end of input.
    #[error("invalid content-length: {0}")]
    InvalidContentLength(String),

    /// The body is not followed by a NUL octet.
    #[error("frame is missing its NUL terminator")]
    MissingTerminator,

    /// Input ended before the header block was complete.
    #[error("incomplete frame")]
    Incomplete,
}

/// Computes the outgoing heart-beat interval after CONNECTED.
///
/// `client_send` is what the client offered in CONNECT (`cx`). `server_header`
/// is the server's `heart-beat` header (`sx,sy`), where `sy` is how often the
/// server wants to hear from the client. Returns `None` when either side
/// disables heart-beats or the header is absent or unparseable.
pub fn negotiate_heartbeat(client_send: Duration, server_header: Option<&str>) -> Option<Duration> {
    let cx = client_send.as_millis() as u64;
    let sy = server_header?
        .split_once(',')
        .and_then(|(_, sy)| sy.trim().parse::<u64>().ok())?;
    if cx == 0 || sy == 0 {
        return None;
    }
    Some(Duration::from_millis(cx.max(sy)))
}
