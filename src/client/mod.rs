//! The `client` module is a small websocket client for a `streamhub`
//! server. It backs the `client` subcommand and the transport tests.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::info;
use tungstenite::protocol::Message as WsMessage;

use crate::transport::message::{ClientMessage, ServerMessage};
use crate::utils::error::ClientError;

pub struct EventClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl EventClient {
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (stream, _response) = connect_async(url).await?;
        Ok(Self { stream })
    }

    pub async fn ping(&mut self) -> Result<(), ClientError> {
        self.send(&ClientMessage::Ping).await
    }

    pub async fn publish(&mut self, payload: impl Into<String>) -> Result<(), ClientError> {
        self.send(&ClientMessage::Publish {
            payload: payload.into(),
        })
        .await
    }

    /// Sends an arbitrary text frame.
    pub async fn send_raw(&mut self, text: impl Into<String>) -> Result<(), ClientError> {
        self.stream.send(WsMessage::text(text.into())).await?;
        Ok(())
    }

    /// Next frame from the server, or `None` once the connection is closed.
    /// Control and binary frames are skipped.
    pub async fn next_message(&mut self) -> Result<Option<ServerMessage>, ClientError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                WsMessage::Text(text) => return Ok(Some(serde_json::from_str(text.as_str())?)),
                WsMessage::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        let text = serde_json::to_string(message)?;
        self.send_raw(text).await
    }
}

/// Connects to `url`, optionally sends a ping, and prints delivered
/// messages until `count` have arrived or the server closes.
pub async fn run_client(url: &str, ping: bool, count: Option<usize>) -> Result<(), ClientError> {
    let mut client = EventClient::connect(url).await?;
    info!("Connected to {url}");

    if ping {
        client.ping().await?;
    }

    let mut received = 0;
    while count.is_none_or(|limit| received < limit) {
        match client.next_message().await? {
            Some(ServerMessage::Message { data }) => {
                println!("{data}");
                received += 1;
            }
            Some(ServerMessage::Pong) => info!("pong"),
            Some(ServerMessage::Error { message }) => info!("Server error: {message}"),
            None => {
                info!("Server closed the connection");
                return Ok(());
            }
        }
    }

    client.close().await
}
