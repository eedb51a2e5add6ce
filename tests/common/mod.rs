//! In-process STOMP-over-WebSocket node used by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use block_dashboard::stomp::{parse_frames, Command, Frame};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

/// Value of the `server` header in CONNECTED.
pub const SERVER_NAME: &str = "test-node/1.0";

/// How the node treats its one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Answer CONNECT, publish the script once both topics are subscribed,
    /// acknowledge DISCONNECT with a RECEIPT.
    Normal,
    /// Accept the WebSocket but never answer CONNECT.
    Silent,
    /// Like `Normal`, but drop the TCP connection right after publishing.
    DropAfterPublish,
    /// Like `Normal`, but ask the client for a heart-beat every
    /// [`HEARTBEAT_REQUEST_MS`].
    ExpectHeartbeats,
}

/// Receive interval the node announces under [`Behavior::ExpectHeartbeats`].
pub const HEARTBEAT_REQUEST_MS: u64 = 100;

/// A running test node.
pub struct TestNode {
    /// Base URL to hand to `SessionConfig::for_server`.
    pub base_url: String,
    /// Every frame the node received, in order.
    pub frames: mpsc::UnboundedReceiver<Frame>,
    /// Fires once the script has been published.
    pub published: oneshot::Receiver<()>,
    /// One item per bare end-of-line (heart-beat) message from the client.
    pub heartbeats: mpsc::UnboundedReceiver<()>,
}

/// Starts a node that serves exactly one client.
///
/// `script` is a list of `(destination, body)` pairs published in order once
/// the client has subscribed to every destination that appears in it.
pub async fn start_node(behavior: Behavior, script: Vec<(&'static str, String)>) -> TestNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let (frames_tx, frames) = mpsc::unbounded_channel();
    let (published_tx, published) = oneshot::channel();
    let (heartbeats_tx, heartbeats) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let channels = Channels {
            frames: frames_tx,
            published: published_tx,
            heartbeats: heartbeats_tx,
        };
        serve(ws, behavior, script, channels).await;
    });

    TestNode {
        base_url: format!("ws://{addr}"),
        frames,
        published,
        heartbeats,
    }
}

struct Channels {
    frames: mpsc::UnboundedSender<Frame>,
    published: oneshot::Sender<()>,
    heartbeats: mpsc::UnboundedSender<()>,
}

async fn serve(
    ws: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    behavior: Behavior,
    script: Vec<(&'static str, String)>,
    channels: Channels,
) {
    let (mut sink, mut stream) = ws.split();
    let mut subscriptions: HashMap<String, String> = HashMap::new();
    let Channels {
        frames: frames_tx,
        published: published_tx,
        heartbeats: heartbeats_tx,
    } = channels;
    let mut published_tx = Some(published_tx);

    while let Some(Ok(message)) = stream.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        if !text.as_str().is_empty() && text.as_str().chars().all(|c| c == '\n' || c == '\r') {
            let _ = heartbeats_tx.send(());
            continue;
        }
        for frame in parse_frames(text.as_str()).unwrap() {
            let _ = frames_tx.send(frame.clone());
            match frame.command {
                Command::Connect | Command::Stomp => {
                    if behavior == Behavior::Silent {
                        continue;
                    }
                    let heart_beat = match behavior {
                        Behavior::ExpectHeartbeats => format!("0,{HEARTBEAT_REQUEST_MS}"),
                        _ => "0,0".to_string(),
                    };
                    let connected = Frame::new(Command::Connected)
                        .with_header("version", "1.2")
                        .with_header("heart-beat", heart_beat)
                        .with_header("server", SERVER_NAME);
                    send(&mut sink, &connected).await;
                }
                Command::Subscribe => {
                    let id = frame.header("id").unwrap_or_default().to_string();
                    let destination = frame.header("destination").unwrap_or_default().to_string();
                    subscriptions.insert(destination, id);

                    let ready = script
                        .iter()
                        .all(|(destination, _)| subscriptions.contains_key(*destination));
                    if ready && published_tx.is_some() {
                        for (n, (destination, body)) in script.iter().enumerate() {
                            let message = Frame::new(Command::Message)
                                .with_header("destination", *destination)
                                .with_header("subscription", subscriptions[*destination].as_str())
                                .with_header("message-id", n.to_string())
                                .with_header("content-type", "application/json")
                                .with_body(body.as_str());
                            send(&mut sink, &message).await;
                        }
                        if let Some(tx) = published_tx.take() {
                            let _ = tx.send(());
                        }
                        if behavior == Behavior::DropAfterPublish {
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            return;
                        }
                    }
                }
                Command::Disconnect => {
                    if let Some(receipt) = frame.header("receipt") {
                        let reply = Frame::new(Command::Receipt).with_header("receipt-id", receipt);
                        send(&mut sink, &reply).await;
                    }
                    let _ = sink.close().await;
                    return;
                }
                _ => {}
            }
        }
    }
}

async fn send<S>(sink: &mut S, frame: &Frame)
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Debug,
{
    sink.send(Message::Text(frame.encode().into())).await.unwrap();
}

/// Collects the frames the node has received so far.
pub fn drain(frames: &mut mpsc::UnboundedReceiver<Frame>) -> Vec<Frame> {
    let mut out = Vec::new();
    while let Ok(frame) = frames.try_recv() {
        out.push(frame);
    }
    out
}
