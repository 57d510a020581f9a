//! Time settings handlers.

use crate::db;
use crate::error::{AppError, Result};
use journal_engine::{settings_path, StoredTimeSettings};
use sqlx::PgPool;

pub async fn handle_get_settings(pool: &PgPool, owner_id: &str) -> Result<StoredTimeSettings> {
    db::get_settings(pool, owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No document: {}", settings_path(owner_id))))
}

/// Validate and merge-write the settings document.
pub async fn handle_put_settings(
    pool: &PgPool,
    owner_id: &str,
    settings: StoredTimeSettings,
) -> Result<StoredTimeSettings> {
    settings.validate()?;

    let stored = db::upsert_settings(pool, owner_id, &settings).await?;
    tracing::info!(owner_id = %owner_id, "time settings saved");
    Ok(stored)
}
