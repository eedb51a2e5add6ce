pub(crate) use super::*;
pub(crate) use crate::client::{SessionEvent, DEFAULT_HEARTBEAT};
pub(crate) use crate::events::{
    parse_block, parse_transaction, BlockEvent, Topic, TransactionEvent,
};


/// Port 1 on loopback refuses connections, so sessions fail without a server.
pub(crate) const UNREACHABLE: &str = "ws://127.0.0.1:1";

pub(crate) fn make_app() -> App {
    App::new(SessionConfig::for_server(UNREACHABLE, DEFAULT_HEARTBEAT), None)
}

pub(crate) fn block(hash: &str) -> BlockEvent {
    parse_block(&format!(r#"{{"hash":"{hash}"}}"#)).expect("valid block")
}

pub(crate) fn tx(hash: &str) -> TransactionEvent {
    parse_transaction(&format!(r#"{{"txHash":"{hash}"}}"#)).expect("valid tx")
}

/// Wraps `event` with the generation of the app's live handle.
pub(crate) fn current(app: &App, event: SessionEvent) -> SessionEnvelope {
    SessionEnvelope {
        generation: app.current_generation().expect("app should hold a session"),
        event,
    }
}

pub(crate) fn connected() -> SessionEvent {
    SessionEvent::Connected { server: None }
}
