use super::*;
use crate::client::SessionEvent;
use crate::events::Topic;

impl App {
    /// Applies one event from a session task.
    ///
    /// Events whose generation does not match the live handle come from a
    /// replaced or disconnected session and are dropped without effect.
    pub fn apply_session_event(&mut self, envelope: SessionEnvelope) {
        let SessionEnvelope { generation, event } = envelope;
        if self.current_generation() != Some(generation) {
            tracing::debug!(generation, "dropping event from stale session");
            return;
        }

        match event {
            SessionEvent::Connected { server } => {
                tracing::info!(generation, server = ?server, "connected");
                self.dashboard.mark_connected();
                self.subscribe_all();
                self.set_status(match server {
                    Some(server) => format!("Connected to {}", server),
                    None => "Connected".to_string(),
                });
            }
            SessionEvent::Block(block) => {
                self.dashboard.show_block(&block);
            }
            SessionEvent::Transaction(tx) => {
                self.dashboard.show_tx(&tx);
            }
            SessionEvent::Closed { reason } => {
                self.session = None;
                self.subscriptions.clear();
                let was_connected = self.dashboard.is_connected();
                self.dashboard.mark_disconnected();
                match reason {
                    Some(reason) if was_connected => {
                        tracing::warn!(generation, "session closed: {}", reason);
                        self.set_status(format!("Connection lost: {}", reason));
                    }
                    Some(reason) => {
                        tracing::warn!(generation, "connect failed: {}", reason);
                        self.set_status(format!("Connect failed: {}", reason));
                    }
                    None => tracing::info!(generation, "session closed"),
                }
            }
        }
    }

    fn subscribe_all(&mut self) {
        let Some(handle) = self.session.as_mut() else {
            return;
        };
        for topic in Topic::ALL {
            match handle.subscribe(topic) {
                Ok(subscription) => {
                    tracing::debug!(id = subscription.id(), %topic, "subscribed");
                    self.subscriptions.push(subscription);
                }
                Err(e) => tracing::warn!(%topic, "subscribe failed: {}", e),
            }
        }
    }
}
