//! WebSocket receiver built on tokio-tungstenite.

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info};

use super::{FrameSink, FrameSource};
use crate::error::StreamError;

/// Follows a single WebSocket URI.
#[derive(Debug, Clone)]
pub struct WebSocketReceiver {
    target: String,
}

impl WebSocketReceiver {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[async_trait]
impl FrameSource for WebSocketReceiver {
    async fn receive(&self, sink: &FrameSink) -> StreamError {
        let (mut stream, _response) = match connect_async(self.target.as_str()).await {
            Ok(connected) => connected,
            Err(e) => return classify_connect_error(&self.target, e),
        };
        info!("🔌 Connected to {}", self.target);

        while let Some(frame) = stream.next().await {
            let payload = match frame {
                Ok(Message::Text(text)) => text.to_string(),
                Ok(Message::Binary(data)) => String::from_utf8_lossy(&data).into_owned(),
                Ok(Message::Close(close)) => {
                    let reason = match close {
                        Some(close) => format!("peer sent close ({} {})", close.code, &*close.reason),
                        None => "peer sent close".to_string(),
                    };
                    return StreamError::ConnectionClosed(reason);
                }
                // Ping/pong replies are handled by tungstenite.
                Ok(_) => continue,
                Err(e) => return StreamError::ConnectionClosed(e.to_string()),
            };

            if sink.send(payload).await.is_err() {
                return StreamError::QueueClosed;
            }
        }

        debug!("Stream from {} ended without a close frame", self.target);
        StreamError::ConnectionClosed("stream ended".to_string())
    }
}

/// Maps a failed connect into the receiver's error classes.
fn classify_connect_error(target: &str, error: WsError) -> StreamError {
    let target = target.to_string();
    match error {
        WsError::Url(e) => StreamError::InvalidTarget {
            target,
            reason: e.to_string(),
        },
        WsError::Http(response) => StreamError::Handshake {
            target,
            reason: format!("server answered HTTP {}", response.status()),
        },
        WsError::HttpFormat(e) => StreamError::Handshake {
            target,
            reason: e.to_string(),
        },
        WsError::Protocol(e) => StreamError::Handshake {
            target,
            reason: e.to_string(),
        },
        other => StreamError::Connect {
            target,
            reason: other.to_string(),
        },
    }
}
