use crate::error::SessionError;
use crate::signaling::{RelayConnector, SignalingChannel};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshvoice_core::{ClientMessage, ServerMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

/// Connects to a relay's `/ws` endpoint over WebSocket.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// `url` is the full endpoint, e.g. `ws://127.0.0.1:3000/ws`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RelayConnector for WsConnector {
    async fn connect(&self) -> Result<SignalingChannel, SessionError> {
        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| SessionError::Relay(format!("{}: {}", self.url, e)))?;
        info!("Connected to relay at {}", self.url);

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<ClientMessage>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<ServerMessage>();

        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                match serde_json::to_string(&msg) {
                    Ok(json) => {
                        if ws_sender.send(WsMessage::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => error!("Failed to serialize client message: {}", e),
                }
            }
            let _ = ws_sender.close().await;
            debug!("Relay writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = ws_receiver.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(msg) => {
                                if inbound_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Invalid ServerMessage: {}", e),
                        }
                    }
                    Ok(WsMessage::Close(_)) => {
                        info!("Relay closed the connection");
                        break;
                    }
                    Err(e) => {
                        warn!("Relay WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(SignalingChannel { outbound, inbound })
    }
}
