use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::session_manager::AppState;
use crate::types::WebSocketMessage;

/// WebSocket handler streaming the device screen
pub async fn screen_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("🔌 Screen stream connection request");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    info!("✅ Screen stream connected");

    let (mut sender, mut receiver) = socket.split();
    let mut ticker = tokio::time::interval(state.frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frame_count: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let message = match state.manager.screen_frame().await {
                    Ok(Some(data)) => WebSocketMessage::Screen { data },
                    // idle until a session is initialised
                    Ok(None) => continue,
                    Err(message) => WebSocketMessage::Error { message },
                };

                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("⚠️ Failed to serialize screen message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sender.send(Message::Text(text.into())).await {
                    warn!("❌ Failed to send screen frame: {}", e);
                    break;
                }
                frame_count += 1;
                debug!("Sent frame {}", frame_count);
            }

            // Handle incoming messages (ping/close)
            msg_result = receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        if text.as_str() == "ping" {
                            let _ = sender.send(Message::Text("pong".into())).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("🔌 WebSocket close received");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("❌ WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!("🔌 WebSocket stream ended");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("📊 Screen stream sent {} frames", frame_count);
}
