use crate::signaling::{Connection, Dispatcher, SignalingService};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let connection = Connection::new(tx);
    let connection_id = connection.id();
    info!(connection = %connection_id, "New WebSocket connection");

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // A dead writer is left to the reaper; the read side alone decides when
    // the connection is gone.
    let mut dispatcher = Dispatcher::new(service, connection);
    while let Some(Ok(msg)) = receiver.next().await {
        dispatcher.connection().touch();
        match msg {
            Message::Text(text) => dispatcher.handle_text(text.as_str()).await,
            Message::Close(_) => break,
            Message::Binary(_) => debug!(connection = %connection_id, "Ignoring binary frame"),
            _ => {}
        }
    }

    send_task.abort();
    dispatcher.disconnect().await;
    info!(connection = %connection_id, "WebSocket disconnected");
}
