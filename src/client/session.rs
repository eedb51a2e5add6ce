//! Session task and its handle.
//!
//! The task owns the WebSocket. It connects, performs the STOMP CONNECT
//! exchange, then multiplexes owner commands, inbound frames, and outgoing
//! heart-beats until the owner disconnects or the transport ends.

use std::collections::HashMap;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::client::{ClientError, ClientResult, SessionConfig, SessionEnvelope, SessionEvent};
use crate::events::{parse_block, parse_transaction, Topic};
use crate::stomp::{negotiate_heartbeat, parse_frames, Command, Frame};

/// How long to wait for the RECEIPT of a DISCONNECT before closing anyway.
const DISCONNECT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(2);

/// Receipt id attached to the DISCONNECT frame.
const DISCONNECT_RECEIPT: &str = "disconnect";

/// Requests from the handle to the session task.
#[derive(Debug)]
enum SessionCommand {
    Subscribe { id: String, topic: Topic },
    Unsubscribe { id: String },
    Disconnect,
}

/// A registered subscription. Pass it to [`SessionHandle::unsubscribe`] to
/// cancel it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    id: String,
    topic: Topic,
}

impl Subscription {
    /// Subscription id sent in the SUBSCRIBE frame.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Topic this subscription delivers.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

/// Handle to a running session.
///
/// Dropping the handle without calling [`disconnect`](Self::disconnect) also
/// ends the session: the task sees its command channel close.
#[derive(Debug)]
pub struct SessionHandle {
    generation: u64,
    commands: mpsc::UnboundedSender<SessionCommand>,
    task: JoinHandle<()>,
    next_subscription: u32,
}

/// Starts a session task. Events are tagged with `generation`.
///
/// Returns immediately; the outcome of the connection attempt is reported
/// through `events` as [`SessionEvent::Connected`] or
/// [`SessionEvent::Closed`]. Must be called from within a tokio runtime.
pub fn spawn_session(
    config: SessionConfig,
    generation: u64,
    events: mpsc::Sender<SessionEnvelope>,
) -> SessionHandle {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let emitter = Emitter { generation, events };
    let task = tokio::spawn(run_session(config, command_rx, emitter));
    SessionHandle {
        generation,
        commands,
        task,
        next_subscription: 0,
    }
}

impl SessionHandle {
    /// Generation this handle was spawned with.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `true` once the session task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Subscribes to `topic`. The SUBSCRIBE frame is sent asynchronously.
    pub fn subscribe(&mut self, topic: Topic) -> ClientResult<Subscription> {
        let id = format!("sub-{}", self.next_subscription);
        self.next_subscription += 1;
        self.commands
            .send(SessionCommand::Subscribe {
                id: id.clone(),
                topic,
            })
            .map_err(|_| ClientError::SessionEnded)?;
        Ok(Subscription { id, topic })
    }

    /// Cancels a subscription. Messages already queued may still arrive.
    pub fn unsubscribe(&self, subscription: &Subscription) -> ClientResult<()> {
        self.commands
            .send(SessionCommand::Unsubscribe {
                id: subscription.id.clone(),
            })
            .map_err(|_| ClientError::SessionEnded)
    }

    /// Requests termination of the session. Never blocks.
    ///
    /// The task sends DISCONNECT (if connected), waits briefly for the
    /// receipt, closes the socket, and emits [`SessionEvent::Closed`].
    pub fn disconnect(self) {
        if self.commands.send(SessionCommand::Disconnect).is_err() {
            tracing::debug!(generation = self.generation, "session already ended");
        }
    }
}

/// Sends tagged events to the session owner.
struct Emitter {
    generation: u64,
    events: mpsc::Sender<SessionEnvelope>,
}

impl Emitter {
    async fn emit(&self, event: SessionEvent) -> ClientResult<()> {
        self.events
            .send(SessionEnvelope {
                generation: self.generation,
                event,
            })
            .await
            .map_err(|_| ClientError::EventsDropped)
    }
}

/// What one transport message amounted to.
enum Inbound {
    Frames(Vec<Frame>),
    Closed(Option<String>),
}

async fn run_session(
    config: SessionConfig,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    emitter: Emitter,
) {
    let generation = emitter.generation;
    let reason = match drive(&config, &mut commands, &emitter).await {
        Ok(()) => {
            tracing::info!(generation, "session closed");
            None
        }
        Err(ClientError::EventsDropped) => {
            tracing::debug!(generation, "session owner went away");
            return;
        }
        Err(e) => {
            tracing::warn!(generation, url = %config.url, "session ended: {}", e);
            Some(e.to_string())
        }
    };
    let _ = emitter.emit(SessionEvent::Closed { reason }).await;
}

async fn drive(
    config: &SessionConfig,
    commands: &mut mpsc::UnboundedReceiver<SessionCommand>,
    emitter: &Emitter,
) -> ClientResult<()> {
    tracing::debug!(url = %config.url, "opening transport");
    let ws = tokio::select! {
        result = connect_async(config.url.as_str()) => result?.0,
        _ = wait_for_disconnect(commands) => {
            tracing::debug!("disconnect requested before transport opened");
            return Ok(());
        }
    };
    let (mut sink, mut stream) = ws.split();

    send_frame(&mut sink, &Frame::connect(config.host(), config.heartbeat)).await?;

    let Some(connected) = await_connected(&mut stream, commands).await? else {
        let _ = sink.close().await;
        return Ok(());
    };

    let server = connected.header("server").map(str::to_string);
    tracing::info!(
        url = %config.url,
        version = connected.header("version").unwrap_or("1.0"),
        "session established"
    );
    let mut heartbeat =
        negotiate_heartbeat(config.heartbeat, connected.header("heart-beat")).map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
    emitter.emit(SessionEvent::Connected { server }).await?;

    let mut subscriptions: HashMap<String, Topic> = HashMap::new();
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(SessionCommand::Subscribe { id, topic }) => {
                    send_frame(&mut sink, &Frame::subscribe(&id, topic.destination())).await?;
                    tracing::debug!(%id, %topic, "subscribed");
                    subscriptions.insert(id, topic);
                }
                Some(SessionCommand::Unsubscribe { id }) => {
                    if subscriptions.remove(&id).is_some() {
                        send_frame(&mut sink, &Frame::unsubscribe(&id)).await?;
                        tracing::debug!(%id, "unsubscribed");
                    }
                }
                Some(SessionCommand::Disconnect) | None => {
                    send_frame(&mut sink, &Frame::disconnect(DISCONNECT_RECEIPT)).await?;
                    if tokio::time::timeout(DISCONNECT_RECEIPT_TIMEOUT, await_receipt(&mut stream))
                        .await
                        .is_err()
                    {
                        tracing::debug!("no receipt for DISCONNECT, closing anyway");
                    }
                    let _ = sink.close().await;
                    return Ok(());
                }
            },
            message = stream.next() => {
                let message = message.ok_or(ClientError::ConnectionClosed)??;
                match classify(message) {
                    Inbound::Frames(frames) => {
                        for frame in frames {
                            dispatch(frame, &subscriptions, emitter).await?;
                        }
                    }
                    Inbound::Closed(reason) => return Err(ClientError::ClosedByServer { reason }),
                }
            }
            _ = next_heartbeat(&mut heartbeat) => {
                sink.send(Message::Text(String::from("\n").into())).await?;
            }
        }
    }
}

/// Routes one frame received after CONNECTED.
async fn dispatch(
    frame: Frame,
    subscriptions: &HashMap<String, Topic>,
    emitter: &Emitter,
) -> ClientResult<()> {
    match frame.command {
        Command::Message => {
            let Some(topic) = frame
                .header("subscription")
                .and_then(|id| subscriptions.get(id))
            else {
                tracing::debug!(
                    subscription = frame.header("subscription").unwrap_or("<none>"),
                    "message for unknown subscription dropped"
                );
                return Ok(());
            };
            let event = match topic {
                Topic::Blocks => parse_block(&frame.body).map(SessionEvent::Block),
                Topic::Transactions => parse_transaction(&frame.body).map(SessionEvent::Transaction),
            };
            match event {
                Ok(event) => emitter.emit(event).await,
                Err(e) => {
                    tracing::warn!("dropping payload: {}", e);
                    Ok(())
                }
            }
        }
        Command::Error => Err(server_error(&frame)),
        Command::Receipt => {
            tracing::debug!(receipt = frame.header("receipt-id").unwrap_or(""), "receipt");
            Ok(())
        }
        other => {
            tracing::debug!(command = %other, "ignoring frame");
            Ok(())
        }
    }
}

/// Waits for CONNECTED. Returns `None` if the owner disconnects first.
async fn await_connected<St>(
    stream: &mut St,
    commands: &mut mpsc::UnboundedReceiver<SessionCommand>,
) -> ClientResult<Option<Frame>>
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        tokio::select! {
            message = stream.next() => {
                let message = message.ok_or(ClientError::ConnectionClosed)??;
                match classify(message) {
                    Inbound::Frames(frames) => {
                        if let Some(frame) = frames.into_iter().next() {
                            return match frame.command {
                                Command::Connected => Ok(Some(frame)),
                                Command::Error => Err(server_error(&frame)),
                                other => Err(ClientError::UnexpectedFrame(other)),
                            };
                        }
                    }
                    Inbound::Closed(reason) => return Err(ClientError::ClosedByServer { reason }),
                }
            }
            command = commands.recv() => match command {
                Some(SessionCommand::Disconnect) | None => return Ok(None),
                Some(other) => tracing::debug!("ignoring {:?} before CONNECTED", other),
            }
        }
    }
}

/// Reads until the DISCONNECT receipt or the end of the stream.
async fn await_receipt<St>(stream: &mut St)
where
    St: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(Ok(message)) = stream.next().await {
        match classify(message) {
            Inbound::Frames(frames) => {
                if frames.iter().any(|f| {
                    f.command == Command::Receipt
                        && f.header("receipt-id") == Some(DISCONNECT_RECEIPT)
                }) {
                    return;
                }
            }
            Inbound::Closed(_) => return,
        }
    }
}

/// Resolves when a disconnect is requested or the handle is dropped.
async fn wait_for_disconnect(commands: &mut mpsc::UnboundedReceiver<SessionCommand>) {
    while let Some(command) = commands.recv().await {
        if matches!(command, SessionCommand::Disconnect) {
            return;
        }
        tracing::debug!("ignoring {:?} before transport opened", command);
    }
}

/// Ticks the heart-beat timer, or never resolves when heart-beats are off.
async fn next_heartbeat(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn classify(message: Message) -> Inbound {
    let text = match message {
        Message::Text(text) => text.as_str().to_string(),
        Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Message::Close(frame) => return Inbound::Closed(frame.map(|f| f.reason.as_str().to_string())),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
            return Inbound::Frames(Vec::new())
        }
    };
    match parse_frames(&text) {
        Ok(frames) => Inbound::Frames(frames),
        Err(e) => {
            tracing::warn!("discarding undecodable frame: {}", e);
            Inbound::Frames(Vec::new())
        }
    }
}

fn server_error(frame: &Frame) -> ClientError {
    let message = frame
        .header("message")
        .map(str::to_string)
        .unwrap_or_else(|| frame.body.trim().to_string());
    ClientError::Server { message }
}

async fn send_frame<S>(sink: &mut S, frame: &Frame) -> ClientResult<()>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    tracing::trace!(command = %frame.command, "sending frame");
    sink.send(Message::Text(frame.encode().into())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Message {
        Message::Text(s.to_string().into())
    }

    #[test]
    fn test_classify_text_frame() {
        match classify(text("MESSAGE\nsubscription:sub-0\n\n{}\0")) {
            Inbound::Frames(frames) => {
                assert_eq!(frames.len(), 1);
                assert_eq!(frames[0].command, Command::Message);
            }
            Inbound::Closed(_) => panic!("expected frames"),
        }
    }

    #[test]
    fn test_classify_heartbeat_is_empty() {
        assert!(matches!(classify(text("\n")), Inbound::Frames(f) if f.is_empty()));
    }

    #[test]
    fn test_classify_garbage_is_dropped() {
        assert!(matches!(classify(text("garbage")), Inbound::Frames(f) if f.is_empty()));
    }

    #[test]
    fn test_classify_close() {
        assert!(matches!(classify(Message::Close(None)), Inbound::Closed(None)));
    }

    #[test]
    fn test_server_error_prefers_message_header() {
        let frame = Frame::new(Command::Error)
            .with_header("message", "bad destination")
            .with_body("details");
        match server_error(&frame) {
            ClientError::Server { message } => assert_eq!(message, "bad destination"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_server_error_falls_back_to_body() {
        let frame = Frame::new(Command::Error).with_body(" oops \n");
        match server_error(&frame) {
            ClientError::Server { message } => assert_eq!(message, "oops"),
            other => panic!("unexpected {:?}", other),
        }
    }

    fn emitter() -> (Emitter, mpsc::Receiver<SessionEnvelope>) {
        let (tx, rx) = mpsc::channel(8);
        (
            Emitter {
                generation: 3,
                events: tx,
            },
            rx,
        )
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_subscription() {
        let (emitter, mut rx) = emitter();
        let mut subs = HashMap::new();
        subs.insert("sub-0".to_string(), Topic::Blocks);
        subs.insert("sub-1".to_string(), Topic::Transactions);

        let block = Frame::new(Command::Message)
            .with_header("subscription", "sub-0")
            .with_body(r#"{"hash":"0xabc"}"#);
        dispatch(block, &subs, &emitter).await.unwrap();

        let tx = Frame::new(Command::Message)
            .with_header("subscription", "sub-1")
            .with_body(r#"{"txHash":"0xdef"}"#);
        dispatch(tx, &subs, &emitter).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.generation, 3);
        assert!(matches!(first.event, SessionEvent::Block(ref b) if b.hash == "0xabc"));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second.event, SessionEvent::Transaction(ref t) if t.tx_hash == "0xdef"));
    }

    #[tokio::test]
    async fn test_dispatch_drops_malformed_payload() {
        let (emitter, mut rx) = emitter();
        let mut subs = HashMap::new();
        subs.insert("sub-0".to_string(), Topic::Blocks);

        let bad = Frame::new(Command::Message)
            .with_header("subscription", "sub-0")
            .with_body("{not json");
        dispatch(bad, &subs, &emitter).await.unwrap();
        let missing = Frame::new(Command::Message)
            .with_header("subscription", "sub-0")
            .with_body(r#"{"index":4}"#);
        dispatch(missing, &subs, &emitter).await.unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_drops_unknown_subscription() {
        let (emitter, mut rx) = emitter();
        let subs = HashMap::new();
        let frame = Frame::new(Command::Message)
            .with_header("subscription", "sub-9")
            .with_body(r#"{"hash":"0xabc"}"#);
        dispatch(frame, &subs, &emitter).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_error_frame_ends_session() {
        let (emitter, _rx) = emitter();
        let frame = Frame::new(Command::Error).with_header("message", "boom");
        let err = dispatch(frame, &HashMap::new(), &emitter).await.unwrap_err();
        assert!(matches!(err, ClientError::Server { .. }));
    }

    #[tokio::test]
    async fn test_subscribe_allocates_sequential_ids() {
        let (tx, _rx) = mpsc::channel(8);
        // Nothing listens on port 9 (discard); the task fails or stays pending.
        let config = SessionConfig::for_server("ws://127.0.0.1:9", Duration::ZERO);
        let mut handle = spawn_session(config, 1, tx);
        assert_eq!(handle.generation(), 1);
        let blocks = handle.subscribe(Topic::Blocks);
        let txs = handle.subscribe(Topic::Transactions);
        if let (Ok(blocks), Ok(txs)) = (blocks, txs) {
            assert_eq!(blocks.id(), "sub-0");
            assert_eq!(blocks.topic(), Topic::Blocks);
            assert_eq!(txs.id(), "sub-1");
        }
        handle.disconnect();
    }
}
