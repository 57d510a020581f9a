//! WebSocket handler for live collection subscriptions.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use journal_engine::{EntryQuery, LiveClientMessage, LiveServerMessage};
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::db;
use crate::live::LiveHub;

/// Handle an established live subscription.
///
/// Registers with the hub, sends the current snapshot, then answers pings
/// until the client goes away. Snapshots after writes arrive through the
/// hub. The initial snapshot is skipped when a write's publish already
/// delivered a newer one.
pub async fn handle_live_connection(
    socket: WebSocket,
    pool: PgPool,
    live: Arc<LiveHub>,
    owner_id: String,
    query: EntryQuery,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<LiveServerMessage>();

    let conn_id = live.register(&owner_id, query, tx);

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                        tracing::warn!("Failed to send live message: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize live message: {}", e);
                }
            }
        }
    });

    let sequence = live.next_sequence();
    let initial = match db::list_entries(&pool, &owner_id, query.direction).await {
        Ok(entries) => LiveServerMessage::snapshot(entries),
        Err(e) => {
            tracing::error!(owner_id = %owner_id, error = ?e, "failed to read initial snapshot");
            LiveServerMessage::error("unavailable")
        }
    };
    if !live.send_snapshot(&conn_id, sequence, initial) {
        tracing::debug!(conn_id = %conn_id, "initial snapshot superseded by a newer publish");
    }

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<LiveClientMessage>(&text) {
                    Ok(LiveClientMessage::Ping) => LiveServerMessage::Pong,
                    Err(e) => LiveServerMessage::error(format!("Invalid message format: {}", e)),
                };
                live.send_to(&conn_id, reply);
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!("Binary messages not supported");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                tracing::debug!(conn_id = %conn_id, "live close frame received");
                break;
            }
            Err(e) => {
                tracing::warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    live.unregister(&conn_id);
    send_task.abort();

    tracing::info!(
        conn_id = %conn_id,
        owner_id = %owner_id,
        active_connections = live.connection_count(),
        "live subscriber disconnected"
    );
}
