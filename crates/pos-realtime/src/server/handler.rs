//! WebSocket handler
//!
//! Authenticates the upgrade request, then runs one admitted connection:
//! a writer task draining its outbound queue and a reader loop dispatching
//! inbound frames.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use pos_core::Identity;
use tokio::sync::{mpsc, watch};

use super::handshake::{Handshake, HandshakeQuery};
use crate::connection::Connection;
use crate::handlers::{error_frame, HandlerError, MessageDispatcher};
use crate::manager::RoomManager;
use crate::protocol::Envelope;
use crate::response::ApiError;
use crate::server::GatewayState;

/// WebSocket upgrade handler
///
/// The credential is checked before upgrading, so a refused client gets a
/// plain HTTP error and never becomes a connection.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    Query(query): Query<HandshakeQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let mut handshake = Handshake::new(query, &headers);

    match handshake.authenticate(state.jwt()) {
        Ok(identity) => ws
            .on_upgrade(move |socket| handle_socket(state, socket, identity))
            .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Run an admitted WebSocket connection until either side closes it
async fn handle_socket(state: GatewayState, socket: WebSocket, identity: Identity) {
    let connection_id = Connection::generate_id();

    // Outbound queue; a full queue drops events for this connection only
    let buffer = state.config().realtime.outbound_buffer.max(1);
    let (tx, rx) = mpsc::channel::<Envelope>(buffer);

    let connection = Connection::new(connection_id.clone(), identity, tx);
    let close_signal = connection.close_signal();

    tracing::info!(
        connection_id = %connection_id,
        user_id = %connection.identity().id,
        "WebSocket connection established"
    );

    let (ws_sink, mut ws_stream) = socket.split();

    let mut send_task = tokio::spawn(write_loop(ws_sink, rx, close_signal, connection_id.clone()));

    let manager = state.manager_handle();
    manager.admit(connection.clone());

    let recv_manager = manager.clone();
    let recv_connection = connection.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    MessageDispatcher::handle_text(&recv_manager, &recv_connection, &text);
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        connection_id = %recv_connection.id(),
                        "Binary messages not supported"
                    );
                    recv_manager.send_to(
                        recv_connection.id(),
                        error_frame(
                            &HandlerError::MalformedFrame("binary frames are not supported".into()),
                            None,
                        ),
                    );
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Pong is handled automatically by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %recv_connection.id(), "Client closed connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %recv_connection.id(),
                        error = %e,
                        "WebSocket error"
                    );
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task ended");
            send_task.abort();
        }
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
            recv_task.abort();
        }
    }

    cleanup_connection(&manager, &connection_id);
}

/// Forward queued frames to the socket until the queue closes or a close is requested
async fn write_loop(
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Envelope>,
    mut close_signal: watch::Receiver<bool>,
    connection_id: String,
) {
    loop {
        if *close_signal.borrow() {
            break;
        }

        tokio::select! {
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                match msg.to_json() {
                    Ok(json) => {
                        if ws_sink.send(Message::Text(json.into())).await.is_err() {
                            tracing::warn!(
                                connection_id = %connection_id,
                                "Failed to send message to WebSocket"
                            );
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(connection_id = %connection_id, error = %e, "Failed to encode frame");
                    }
                }
            }
            changed = close_signal.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    // Close the WebSocket when the queue is closed or the server asked
    let _ = ws_sink.send(Message::Close(None)).await;
    let _ = ws_sink.close().await;
}

/// Clean up a connection on disconnect
fn cleanup_connection(manager: &RoomManager, connection_id: &str) {
    tracing::info!(connection_id = %connection_id, "Cleaning up connection");

    if !manager.remove(connection_id) {
        tracing::debug!(connection_id = %connection_id, "Connection already removed");
    }
}
