// routes/ws.rs
// GET /ws -> event socket. Each text frame is one request; broadcasts fan out
// to every connection, replies go back to the sender only.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::{
    fmt::Display,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{debug, info, warn};

use crate::{
    events::ServerMessage,
    state::{AppState, Collection},
};

static CONNECTION_IDS: AtomicU64 = AtomicU64::new(1);

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();
    serve_connection(state, sender, receiver).await;
}

fn frame(message: &ServerMessage) -> Message {
    Message::Text(message.to_text().into())
}

/// Runs one connection until the peer closes it or the stream fails.
///
/// On connect the peer receives a snapshot of every collection. A writer task
/// then merges this connection's replies with the shared broadcast feed; when
/// the feed lags, the missed frames are replaced by a fresh snapshot.
pub async fn serve_connection<W, R, E>(state: Arc<AppState>, mut sender: W, mut receiver: R)
where
    W: Sink<Message> + Unpin + Send + 'static,
    W::Error: Send,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let connection = CONNECTION_IDS.fetch_add(1, Ordering::Relaxed);
    info!(connection, "socket connected");

    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut events = state.subscribe();

    for message in state.snapshot(&Collection::SNAPSHOT).await {
        let _ = reply_tx.send(message);
    }

    let writer_state = state.clone();
    let writer = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                Some(reply) = reply_rx.recv() => reply,
                received = events.recv() => match received {
                    Ok(message) => message,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(connection, skipped, "socket lagged; resending snapshot");
                        for message in writer_state.snapshot(&Collection::SNAPSHOT).await {
                            if sender.send(frame(&message)).await.is_err() {
                                return;
                            }
                        }
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                else => break,
            };
            if sender.send(frame(&message)).await.is_err() {
                break;
            }
        }
    });

    while let Some(received) = receiver.next().await {
        match received {
            Ok(Message::Text(text)) => {
                // Broadcasts are already published by the time this returns.
                let dispatch = state.handle_text(text.as_str()).await;
                for reply in dispatch.replies {
                    let _ = reply_tx.send(reply);
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(connection, error = %err, "socket read failed");
                break;
            }
        }
    }

    writer.abort();
    info!(connection, "socket disconnected");
}
