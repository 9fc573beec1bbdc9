//! WebSocket transport
//!
//! This file implements the stream adapter between websocket clients and
//! the hub. Responsibilities:
//! - Accept TCP/WebSocket connections until the server is cancelled
//! - Give each connection its own hub `Subscription` and relay every
//!   delivered message to the client as a `message` frame
//! - Turn client `ping`/`publish` frames into hub publishes
//! - End the connection when the client leaves, a write fails, or the hub
//!   closes the subscription; dropping the subscription deregisters it

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

use crate::hub::{Hub, Publisher};
use crate::transport::message::{ClientMessage, ServerMessage};
use crate::utils::error::ServerError;

/// Binds `addr` and serves websocket clients until `cancel` fires.
pub async fn start_websocket_server(
    addr: String,
    hub: Hub,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket server listening on ws://{}", listener.local_addr()?);

    serve(listener, hub, cancel).await;
    Ok(())
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, hub: Hub, cancel: CancellationToken) {
    loop {
        let (stream, peer) = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Failed to accept connection: {e}");
                    continue;
                }
            },
        };

        tokio::spawn(handle_connection(stream, peer, hub.clone()));
    }

    info!("WebSocket server stopped accepting connections");
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, hub: Hub) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake error from {peer}: {e}");
            return;
        }
    };

    let conn_id = Uuid::new_v4();
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut subscription = hub.subscribe();
    let publisher = hub.publisher();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ServerMessage>();

    info!("{conn_id} connected from {peer}");

    let send_loop = async {
        loop {
            let outbound = tokio::select! {
                delivered = subscription.recv() => match delivered {
                    Some(message) => ServerMessage::Message {
                        data: message.to_string(),
                    },
                    None => {
                        debug!("{conn_id} subscription closed by hub");
                        break;
                    }
                },
                reply = reply_rx.recv() => match reply {
                    Some(reply) => reply,
                    None => break,
                },
            };

            let text = match serde_json::to_string(&outbound) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to serialize frame for {conn_id}: {e}");
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(WsMessage::text(text)).await {
                warn!("Failed to send message to {conn_id}: {e}");
                break;
            }
        }
    };

    let recv_loop = async {
        while let Some(frame) = ws_receiver.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    handle_client_message(&publisher, peer, text.as_str(), &reply_tx).await;
                }
                Ok(WsMessage::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("{conn_id} read error: {e}");
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = send_loop => {}
        _ = recv_loop => {}
    }

    subscription.unsubscribe();
    let _ = ws_sender.close().await;
    info!("{conn_id} disconnected");
}

/// Applies one text frame from a client.
///
/// Waits for publish capacity, so a stalled hub stops this connection from
/// reading further frames.
pub(crate) async fn handle_client_message(
    publisher: &Publisher,
    peer: SocketAddr,
    text: &str,
    replies: &mpsc::UnboundedSender<ServerMessage>,
) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping) => {
            publisher.publish(format!("{}: ping", peer.ip())).await;
            let _ = replies.send(ServerMessage::Pong);
        }
        Ok(ClientMessage::Publish { payload }) => {
            debug!("{peer} published {} bytes", payload.len());
            publisher.publish(payload).await;
        }
        Err(err) => {
            warn!(
                "Invalid client message from {peer}: {err} | {}",
                text.chars().take(100).collect::<String>()
            );
            let _ = replies.send(ServerMessage::Error {
                message: format!("invalid message: {err}"),
            });
        }
    }
}
