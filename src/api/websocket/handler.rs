//! WebSocket connection handler

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{
            close_code, rejection::WebSocketUpgradeRejection, CloseFrame, Message, WebSocket,
            WebSocketUpgrade,
        },
        Path, State,
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::messages::{ClientMessage, PongMessage};
use super::state::AppState;
use crate::api::rest::ApiError;

/// Close code sent when the requested log does not exist
pub const CLOSE_UNKNOWN_LOG: u16 = 4404;

/// WebSocket upgrade handler for `/ws/:log`
///
/// Unknown logs are refused with 404 before the upgrade is looked at.
pub async fn ws_handler(
    Path(log): Path<String>,
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if !state.service.registry().contains(&log) {
        return ApiError::not_found(format!("unknown log '{}'", log)).into_response();
    }

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, state, log)),
        Err(rejection) => rejection.into_response(),
    }
}

fn close_message(code: u16, reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: Cow::Borrowed(reason),
    }))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, log: String) {
    let subscription = match state.service.connect(&log) {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(log, error = %e, "rejecting subscriber");
            let _ = socket.send(close_message(CLOSE_UNKNOWN_LOG, "unknown log")).await;
            return;
        }
    };
    let id = subscription.id;
    let mut updates = subscription.receiver;
    info!(log, connection = %id, "subscriber connected");

    let (mut sink, mut stream) = socket.split();
    let (control_tx, mut control_rx) = mpsc::channel::<Message>(8);

    // Writer: full state and deltas from the manager, replies from the reader
    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(text) = updates.recv() => {
                    if sink.send(Message::Text(text.to_string())).await.is_err() {
                        break; // Client disconnected
                    }
                }
                Some(msg) = control_rx.recv() => {
                    let closing = matches!(msg, Message::Close(_));
                    if sink.send(msg).await.is_err() || closing {
                        break;
                    }
                }
                else => break,
            }
        }
    });

    // Reader: control messages until stop or disconnect
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            if !handle_client_message(msg, &control_tx).await {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => {
            // Dropping the subscription closes the update channel so the
            // writer flushes what is queued and exits
            state.service.disconnect(id);
            let _ = send_task.await;
        }
        _ = &mut send_task => {
            recv_task.abort();
            state.service.disconnect(id);
        }
    }

    info!(log, connection = %id, "subscriber closed");
}

/// Handle a message from the client
/// Returns false if the connection should be closed
async fn handle_client_message(msg: Message, control: &mpsc::Sender<Message>) -> bool {
    match msg {
        Message::Text(text) => match ClientMessage::parse(&text) {
            Some(ClientMessage::Stop) => {
                let _ = control
                    .send(close_message(close_code::NORMAL, "stop"))
                    .await;
                false
            }
            Some(ClientMessage::Ping) => {
                if let Ok(json) = serde_json::to_string(&PongMessage::default()) {
                    let _ = control.send(Message::Text(json)).await;
                }
                true
            }
            None => {
                debug!(message = %text, "ignoring unrecognized client message");
                true
            }
        },
        Message::Binary(_) => true, // Ignore binary messages
        Message::Ping(data) => {
            let _ = control.send(Message::Pong(data)).await;
            true
        }
        Message::Pong(_) => true, // Ignore pong responses
        Message::Close(_) => false, // Client requested close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_requests_close() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(!handle_client_message(Message::Text("stop".to_string()), &tx).await);
        assert!(matches!(rx.recv().await, Some(Message::Close(Some(frame))) if frame.code == close_code::NORMAL));
    }

    #[tokio::test]
    async fn test_ping_answered_with_pong() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(handle_client_message(Message::Text(r#"{"type":"ping"}"#.to_string()), &tx).await);
        match rx.recv().await {
            Some(Message::Text(text)) => assert!(text.contains("pong")),
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_text_keeps_connection_open() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(handle_client_message(Message::Text("hello".to_string()), &tx).await);
        assert!(rx.try_recv().is_err());
        assert!(!handle_client_message(Message::Close(None), &tx).await);
    }
}
