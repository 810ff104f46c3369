//! STOMP-over-WebSocket subscriber
//!
//! Connects once, subscribes to every requested topic and forwards each
//! MESSAGE body, tagged with its topic, into a channel in arrival order.
//! There is no reconnect: when the connection ends a `Closed` event is sent
//! and the reader stops.

use super::stomp::{self, Frame, StompCommand};
use super::Topic;
use crate::{DashboardError, Result};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What the reader forwards to the event loop
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// One JSON payload published on `topic`
    Message { topic: Topic, body: String },
    /// The connection ended; no further events follow
    Closed { reason: String },
}

/// Push subscription client
#[derive(Debug, Clone)]
pub struct PushClient {
    url: String,
    topics: Vec<Topic>,
    connect_timeout: Duration,
}

impl PushClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            topics: Topic::ALL.to_vec(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_topics(mut self, topics: impl IntoIterator<Item = Topic>) -> Self {
        self.topics = topics.into_iter().collect();
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the connection, complete the STOMP handshake and subscribe.
    ///
    /// Returns the reader task once all subscriptions are sent; events are
    /// delivered on `events`.
    pub async fn connect(&self, events: mpsc::Sender<PushEvent>) -> Result<JoinHandle<()>> {
        info!("Connecting to push endpoint {}", self.url);

        let mut ws = timeout(self.connect_timeout, self.handshake())
            .await
            .map_err(|_| {
                DashboardError::Connection(format!(
                    "timed out after {:?} connecting to {}",
                    self.connect_timeout, self.url
                ))
            })??;

        for (i, topic) in self.topics.iter().enumerate() {
            let frame = Frame::subscribe(&format!("sub-{}", i), &topic.destination());
            ws.send(Message::Text(frame.encode()))
                .await
                .map_err(|e| DashboardError::Transport(e.to_string()))?;
            debug!("Subscribed to {}", topic.destination());
        }

        info!("Push connection established, {} topics", self.topics.len());
        Ok(tokio::spawn(read_loop(ws, events)))
    }

    async fn handshake(&self) -> Result<WsStream> {
        let (mut ws, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| DashboardError::Connection(e.to_string()))?;

        ws.send(Message::Text(Frame::connect(&host_of(&self.url)).encode()))
            .await
            .map_err(|e| DashboardError::Transport(e.to_string()))?;

        while let Some(message) = ws.next().await {
            let message = message.map_err(|e| DashboardError::Connection(e.to_string()))?;
            let text = match message {
                Message::Text(text) => text,
                Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Message::Close(_) => break,
                _ => continue,
            };
            for frame in stomp::decode(&text)? {
                match frame.command {
                    StompCommand::Connected => {
                        debug!("STOMP session version {:?}", frame.get("version"));
                        return Ok(ws);
                    }
                    StompCommand::Error => {
                        return Err(DashboardError::Protocol(error_text(&frame)));
                    }
                    other => debug!("Ignoring {} before CONNECTED", other),
                }
            }
        }

        Err(DashboardError::Connection(
            "connection closed during STOMP handshake".to_string(),
        ))
    }
}

async fn read_loop(mut ws: WsStream, events: mpsc::Sender<PushEvent>) {
    let reason = loop {
        let message = match ws.next().await {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                error!("Push connection error: {}", e);
                break e.to_string();
            }
            None => break "connection closed".to_string(),
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Message::Close(frame) => {
                break frame
                    .map(|f| f.reason.to_string())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "closed by server".to_string());
            }
            _ => continue,
        };

        let frames = match stomp::decode(&text) {
            Ok(frames) => frames,
            Err(e) => {
                warn!("Dropping undecodable push message: {}", e);
                continue;
            }
        };

        let mut stop = None;
        for frame in frames {
            match frame.command {
                StompCommand::Message => {
                    let topic = frame.get("destination").and_then(Topic::from_destination);
                    match topic {
                        Some(topic) => {
                            let event = PushEvent::Message { topic, body: frame.body };
                            if events.send(event).await.is_err() {
                                stop = Some("receiver dropped".to_string());
                                break;
                            }
                        }
                        None => debug!("Message for unknown destination {:?}", frame.get("destination")),
                    }
                }
                StompCommand::Error => {
                    stop = Some(error_text(&frame));
                    break;
                }
                other => debug!("Ignoring {} frame", other),
            }
        }
        if let Some(reason) = stop {
            break reason;
        }
    };

    warn!("Push connection ended: {}", reason);
    let _ = ws.send(Message::Text(Frame::disconnect().encode())).await;
    let _ = events.send(PushEvent::Closed { reason }).await;
}

fn error_text(frame: &Frame) -> String {
    match frame.get("message") {
        Some(message) if frame.body.is_empty() => message.to_string(),
        Some(message) => format!("{}: {}", message, frame.body.trim()),
        None => frame.body.trim().to_string(),
    }
}

fn host_of(url: &str) -> String {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let authority = rest.split('/').next().unwrap_or(rest);
    authority
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(authority)
        .to_string()
}
