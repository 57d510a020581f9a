//! Database operations for the time_settings table.

use journal_engine::StoredTimeSettings;
use sqlx::{PgPool, Row};

/// Read an owner's settings document, `None` if never written.
pub async fn get_settings(
    pool: &PgPool,
    owner_id: &str,
) -> Result<Option<StoredTimeSettings>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT morning_unlock, afternoon_unlock, evening_unlock
        FROM time_settings
        WHERE owner_id = $1
        "#,
    )
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    row.map(|row| {
        Ok(StoredTimeSettings {
            morning_unlock: row.try_get("morning_unlock")?,
            afternoon_unlock: row.try_get("afternoon_unlock")?,
            evening_unlock: row.try_get("evening_unlock")?,
        })
    })
    .transpose()
}

/// Merge-write: present fields overwrite, absent ones are kept.
///
/// Returns the document as stored after the merge.
pub async fn upsert_settings(
    pool: &PgPool,
    owner_id: &str,
    settings: &StoredTimeSettings,
) -> Result<StoredTimeSettings, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO time_settings (
            owner_id, morning_unlock, afternoon_unlock, evening_unlock, updated_at
        )
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (owner_id) DO UPDATE SET
            morning_unlock = COALESCE(EXCLUDED.morning_unlock, time_settings.morning_unlock),
            afternoon_unlock = COALESCE(EXCLUDED.afternoon_unlock, time_settings.afternoon_unlock),
            evening_unlock = COALESCE(EXCLUDED.evening_unlock, time_settings.evening_unlock),
            updated_at = EXCLUDED.updated_at
        RETURNING morning_unlock, afternoon_unlock, evening_unlock
        "#,
    )
    .bind(owner_id)
    .bind(&settings.morning_unlock)
    .bind(&settings.afternoon_unlock)
    .bind(&settings.evening_unlock)
    .bind(chrono::Utc::now().timestamp_millis())
    .fetch_one(pool)
    .await?;

    Ok(StoredTimeSettings {
        morning_unlock: row.try_get("morning_unlock")?,
        afternoon_unlock: row.try_get("afternoon_unlock")?,
        evening_unlock: row.try_get("evening_unlock")?,
    })
}
