//! Headless mode: stream block and transaction hashes as text lines.
//!
//! Connects immediately, subscribes to both topics, and writes one line per
//! event (`block <hash>` or `tx <hash>`) until shutdown or session end.

use std::future::Future;
use std::io::Write;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::client::{
    spawn_session, SessionConfig, SessionEvent, SessionHandle, SESSION_EVENT_BUFFER,
};
use crate::events::Topic;

/// Generation used for the single watch session.
const WATCH_GENERATION: u64 = 1;

/// Ways a watch run can fail.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Writing to the output failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// The session ended on its own.
    #[error("session ended: {0}")]
    SessionLost(String),
}

/// Runs one session until `shutdown` resolves or the session closes.
///
/// On shutdown the session is asked to disconnect and the call returns once
/// it reports closed. A session that closes cleanly yields `Ok(())`.
pub async fn run_watch<W, F>(
    config: SessionConfig,
    out: &mut W,
    shutdown: F,
) -> Result<(), WatchError>
where
    W: Write,
    F: Future<Output = ()>,
{
    let (events_tx, mut events_rx) = mpsc::channel(SESSION_EVENT_BUFFER);
    tracing::info!(url = %config.url, "connecting");
    let mut session: Option<SessionHandle> =
        Some(spawn_session(config, WATCH_GENERATION, events_tx));

    tokio::pin!(shutdown);
    let mut shutting_down = false;

    loop {
        tokio::select! {
            _ = &mut shutdown, if !shutting_down => {
                tracing::info!("shutdown requested");
                shutting_down = true;
                if let Some(handle) = session.take() {
                    handle.disconnect();
                }
            }
            envelope = events_rx.recv() => {
                let Some(envelope) = envelope else {
                    return Ok(());
                };
                match envelope.event {
                    SessionEvent::Connected { server } => {
                        tracing::info!(server = ?server, "connected");
                        if let Some(handle) = session.as_mut() {
                            for topic in Topic::ALL {
                                if let Err(e) = handle.subscribe(topic) {
                                    tracing::warn!(%topic, "subscribe failed: {}", e);
                                }
                            }
                        }
                    }
                    SessionEvent::Block(block) => {
                        writeln!(out, "block {}", block.hash)?;
                        out.flush()?;
                    }
                    SessionEvent::Transaction(tx) => {
                        writeln!(out, "tx {}", tx.tx_hash)?;
                        out.flush()?;
                    }
                    SessionEvent::Closed { reason: None } => return Ok(()),
                    SessionEvent::Closed { reason: Some(reason) } => {
                        return Err(WatchError::SessionLost(reason));
                    }
                }
            }
        }
    }
}
