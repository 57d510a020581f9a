//! Settings document route.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use journal_engine::StoredTimeSettings;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{handle_get_settings, handle_put_settings};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/users/{owner_id}/settings/time-settings",
        get(get_handler).put(put_handler),
    )
}

/// GET - 404 when the owner never saved settings.
async fn get_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(owner_id): Path<String>,
) -> Result<Json<StoredTimeSettings>> {
    auth.authorize(&owner_id)?;
    Ok(Json(handle_get_settings(&state.pool, &owner_id).await?))
}

/// PUT - merge-write; every present field must be a valid `HH:MM` time.
async fn put_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(owner_id): Path<String>,
    Json(settings): Json<StoredTimeSettings>,
) -> Result<Json<StoredTimeSettings>> {
    auth.authorize(&owner_id)?;
    Ok(Json(handle_put_settings(&state.pool, &owner_id, settings).await?))
}
