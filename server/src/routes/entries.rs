//! Entry collection routes under `/users/{owner_id}/journal-entries`.

use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use journal_engine::{CreateEntryRequest, CreatedEntry, EntryPatch, EntryQuery, JournalEntry};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{
    handle_create, handle_delete, handle_get, handle_list, handle_live_connection, handle_update,
};
use crate::AppState;

/// Create entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{owner_id}/journal-entries",
            get(list_handler).post(create_handler),
        )
        .route("/users/{owner_id}/journal-entries/live", get(live_handler))
        .route(
            "/users/{owner_id}/journal-entries/{entry_id}",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
}

/// GET - whole collection, ordered by `?direction=` (default newest first).
async fn list_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(owner_id): Path<String>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<Vec<JournalEntry>>> {
    auth.authorize(&owner_id)?;
    let entries = handle_list(&state.pool, &owner_id, query).await?;
    Ok(Json(entries))
}

/// POST - create an entry under a generated ID.
async fn create_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(owner_id): Path<String>,
    Json(request): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<CreatedEntry>)> {
    auth.authorize(&owner_id)?;
    let created = handle_create(&state.pool, &state.live, &owner_id, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((owner_id, entry_id)): Path<(String, String)>,
) -> Result<Json<JournalEntry>> {
    auth.authorize(&owner_id)?;
    let entry = handle_get(&state.pool, &owner_id, &entry_id).await?;
    Ok(Json(entry))
}

/// PATCH - write only the fields present in the body.
async fn update_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((owner_id, entry_id)): Path<(String, String)>,
    Json(patch): Json<EntryPatch>,
) -> Result<StatusCode> {
    auth.authorize(&owner_id)?;
    handle_update(&state.pool, &state.live, &owner_id, &entry_id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE - idempotent.
async fn delete_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((owner_id, entry_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    auth.authorize(&owner_id)?;
    handle_delete(&state.pool, &state.live, &owner_id, &entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /live - upgrade to a live snapshot stream.
async fn live_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(owner_id): Path<String>,
    Query(query): Query<EntryQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    auth.authorize(&owner_id)?;
    tracing::info!(owner_id = %owner_id, "live subscription requested");

    Ok(ws.on_upgrade(move |socket| {
        handle_live_connection(socket, state.pool, state.live, owner_id, query)
    }))
}
