//! Entry handlers - owner-scoped CRUD with live fan-out.

use crate::db;
use crate::error::{AppError, Result};
use crate::live::LiveHub;
use journal_engine::{
    document_path, CreateEntryRequest, CreatedEntry, EntryPatch, EntryQuery, JournalEntry,
    SortDirection, Timestamp,
};
use sqlx::PgPool;

fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}

/// Read an owner's whole collection in the requested order.
pub async fn handle_list(
    pool: &PgPool,
    owner_id: &str,
    query: EntryQuery,
) -> Result<Vec<JournalEntry>> {
    Ok(db::list_entries(pool, owner_id, query.direction).await?)
}

pub async fn handle_get(pool: &PgPool, owner_id: &str, entry_id: &str) -> Result<JournalEntry> {
    db::get_entry(pool, owner_id, entry_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No document: {}", document_path(owner_id, entry_id)))
        })
}

/// Create an entry under a freshly generated ID.
///
/// The client-supplied timestamp is kept when present; otherwise the
/// server's clock stamps the entry.
pub async fn handle_create(
    pool: &PgPool,
    live: &LiveHub,
    owner_id: &str,
    request: CreateEntryRequest,
) -> Result<CreatedEntry> {
    if request.entry.date.trim().is_empty() {
        return Err(AppError::BadRequest("date is required".to_string()));
    }

    let id = uuid::Uuid::new_v4().simple().to_string();
    let timestamp = request.timestamp.unwrap_or_else(now_millis);
    let created_at = i64::try_from(timestamp)
        .map_err(|_| AppError::BadRequest(format!("timestamp out of range: {}", timestamp)))?;

    db::insert_entry(pool, owner_id, &id, &request.entry, created_at).await?;
    tracing::info!(owner_id = %owner_id, entry_id = %id, "journal entry created");

    publish_snapshot(pool, live, owner_id).await;
    Ok(CreatedEntry { id })
}

/// Apply a partial update. Fails with 404 when the entry does not exist.
pub async fn handle_update(
    pool: &PgPool,
    live: &LiveHub,
    owner_id: &str,
    entry_id: &str,
    patch: EntryPatch,
) -> Result<()> {
    if !db::update_entry(pool, owner_id, entry_id, &patch).await? {
        return Err(AppError::NotFound(format!(
            "No document to update: {}",
            document_path(owner_id, entry_id)
        )));
    }
    tracing::info!(owner_id = %owner_id, entry_id = %entry_id, "journal entry updated");

    publish_snapshot(pool, live, owner_id).await;
    Ok(())
}

/// Delete an entry. Deleting a missing entry succeeds without a publish.
pub async fn handle_delete(
    pool: &PgPool,
    live: &LiveHub,
    owner_id: &str,
    entry_id: &str,
) -> Result<()> {
    if db::delete_entry(pool, owner_id, entry_id).await? {
        tracing::info!(owner_id = %owner_id, entry_id = %entry_id, "journal entry deleted");
        publish_snapshot(pool, live, owner_id).await;
    }
    Ok(())
}

/// Push the owner's current collection to their live subscribers.
///
/// A failed read is reported to the subscribers instead of failing the
/// write that triggered it.
pub async fn publish_snapshot(pool: &PgPool, live: &LiveHub, owner_id: &str) {
    if !live.has_subscribers(owner_id) {
        return;
    }

    let sequence = live.next_sequence();
    match db::list_entries(pool, owner_id, SortDirection::Desc).await {
        Ok(entries) => {
            live.publish_snapshot(owner_id, sequence, &entries);
        }
        Err(e) => {
            tracing::error!(owner_id = %owner_id, error = ?e, "failed to read snapshot for live subscribers");
            live.publish_error(owner_id, sequence, "unavailable");
        }
    }
}
