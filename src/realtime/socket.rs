// WebSocket endpoint: each connection joins conduct rooms on request and
// always receives global events.

use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

use crate::config::state::AppState;
use crate::realtime::events::{ClientMessage, ServerEvent};
use crate::realtime::hub::RealtimeHub;

const OUTBOUND_BUFFER: usize = 64;

#[instrument(name = "ws_upgrade", skip(ws, state))]
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket: WebSocket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (outbound, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

    // * Single writer so room forwarders never contend for the sink
    let writer: JoinHandle<()> = tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let global: JoinHandle<()> = forward(state.realtime.subscribe_global(), outbound.clone());
    let mut rooms: HashMap<i64, JoinHandle<()>> = HashMap::new();

    info!("WebSocket client connected");

    while let Some(frame) = stream.next().await {
        let message: Message = match frame {
            Ok(message) => message,
            Err(e) => {
                debug!("WebSocket receive error: {}", e);
                break;
            }
        };

        match message {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(ClientMessage::JoinConduct { conduct_id }) => {
                    if !rooms.contains_key(&conduct_id) {
                        let rx: broadcast::Receiver<ServerEvent> = state.realtime.subscribe(conduct_id).await;
                        rooms.insert(conduct_id, forward(rx, outbound.clone()));
                        info!(conduct_id, "Client joined conduct room");
                    }

                    // ? Late joiners need the current cut-off state straight away
                    let status = state.statuses.get(conduct_id).await;
                    if !send(&outbound, &ServerEvent::SystemStatusUpdate(status)).await {
                        break;
                    }
                }
                Ok(ClientMessage::LeaveConduct { conduct_id }) => {
                    if let Some(handle) = rooms.remove(&conduct_id) {
                        leave_room(&state.realtime, conduct_id, handle).await;
                        info!(conduct_id, "Client left conduct room");
                    }
                }
                Err(e) => warn!("Ignoring malformed WebSocket message: {}", e),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    for (conduct_id, handle) in rooms {
        leave_room(&state.realtime, conduct_id, handle).await;
    }
    global.abort();
    writer.abort();

    info!("WebSocket client disconnected");
}

// ! The forwarder must be gone before pruning, it owns the room receiver
async fn leave_room(hub: &RealtimeHub, conduct_id: i64, handle: JoinHandle<()>) {
    handle.abort();
    let _ = handle.await;
    hub.prune(conduct_id).await;
}

// * Pipes one broadcast receiver into the connection's outbound queue
fn forward(mut rx: broadcast::Receiver<ServerEvent>, outbound: mpsc::Sender<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if !send(&outbound, &event).await {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

// ! Returns false once the connection is gone
async fn send(outbound: &mpsc::Sender<String>, event: &ServerEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(text) => outbound.send(text).await.is_ok(),
        Err(e) => {
            warn!(event = event.name(), "Failed to serialize event: {}", e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn leaving_the_last_listener_drops_the_room() {
        let hub: RealtimeHub = RealtimeHub::default();
        let (outbound, _outbound_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

        let handle: JoinHandle<()> = forward(hub.subscribe(9).await, outbound);
        tokio::task::yield_now().await;

        leave_room(&hub, 9, handle).await;
        assert_eq!(hub.room_count().await, 0);
    }

    #[tokio::test]
    async fn leaving_keeps_rooms_other_clients_still_use() {
        let hub: RealtimeHub = RealtimeHub::default();
        let (outbound, _outbound_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

        let _other = hub.subscribe(9).await;
        let handle: JoinHandle<()> = forward(hub.subscribe(9).await, outbound);

        leave_room(&hub, 9, handle).await;
        assert_eq!(hub.room_count().await, 1);
    }
}
