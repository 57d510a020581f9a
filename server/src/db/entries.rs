//! Database operations for the journal_entries table.

use journal_engine::{EntryPatch, JournalEntry, NewEntry, SortDirection, Timestamp};
use sqlx::{PgPool, Row};

/// A stored entry row from the database.
#[derive(Debug)]
pub struct StoredEntry {
    pub entry_id: String,
    pub date: String,
    pub morning_energy: i32,
    pub afternoon_energy: i32,
    pub evening_energy: i32,
    pub morning_focus: String,
    pub afternoon_moment: String,
    pub evening_emotion: String,
    pub evening_authentic: String,
    pub evening_acting: String,
    pub evening_admiration: String,
    pub created_at: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredEntry {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredEntry {
            entry_id: row.try_get("entry_id")?,
            date: row.try_get("date")?,
            morning_energy: row.try_get("morning_energy")?,
            afternoon_energy: row.try_get("afternoon_energy")?,
            evening_energy: row.try_get("evening_energy")?,
            morning_focus: row.try_get("morning_focus")?,
            afternoon_moment: row.try_get("afternoon_moment")?,
            evening_emotion: row.try_get("evening_emotion")?,
            evening_authentic: row.try_get("evening_authentic")?,
            evening_acting: row.try_get("evening_acting")?,
            evening_admiration: row.try_get("evening_admiration")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl StoredEntry {
    /// Convert a database row to the document shape clients see.
    pub fn into_entry(self) -> JournalEntry {
        JournalEntry {
            id: self.entry_id,
            date: self.date,
            morning_energy: self.morning_energy,
            afternoon_energy: self.afternoon_energy,
            evening_energy: self.evening_energy,
            morning_focus: self.morning_focus,
            afternoon_moment: self.afternoon_moment,
            evening_emotion: self.evening_emotion,
            evening_authentic: self.evening_authentic,
            evening_acting: self.evening_acting,
            evening_admiration: self.evening_admiration,
            timestamp: self.created_at.max(0) as Timestamp,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT entry_id, date, morning_energy, afternoon_energy, evening_energy,
           morning_focus, afternoon_moment, evening_emotion, evening_authentic,
           evening_acting, evening_admiration, created_at
    FROM journal_entries
"#;

/// Insert a new entry.
pub async fn insert_entry(
    pool: &PgPool,
    owner_id: &str,
    entry_id: &str,
    entry: &NewEntry,
    created_at: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO journal_entries (
            owner_id, entry_id, date, morning_energy, afternoon_energy, evening_energy,
            morning_focus, afternoon_moment, evening_emotion, evening_authentic,
            evening_acting, evening_admiration, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(owner_id)
    .bind(entry_id)
    .bind(&entry.date)
    .bind(entry.morning_energy)
    .bind(entry.afternoon_energy)
    .bind(entry.evening_energy)
    .bind(&entry.morning_focus)
    .bind(&entry.afternoon_moment)
    .bind(&entry.evening_emotion)
    .bind(&entry.evening_authentic)
    .bind(&entry.evening_acting)
    .bind(&entry.evening_admiration)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// All entries of an owner ordered by creation time, ties broken by ID.
pub async fn list_entries(
    pool: &PgPool,
    owner_id: &str,
    direction: SortDirection,
) -> Result<Vec<JournalEntry>, sqlx::Error> {
    let order = match direction {
        SortDirection::Asc => "ORDER BY created_at ASC, entry_id ASC",
        SortDirection::Desc => "ORDER BY created_at DESC, entry_id DESC",
    };
    let sql = format!("{} WHERE owner_id = $1 {}", SELECT_COLUMNS, order);

    let rows = sqlx::query_as::<_, StoredEntry>(&sql)
        .bind(owner_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(StoredEntry::into_entry).collect())
}

/// Get a single entry.
pub async fn get_entry(
    pool: &PgPool,
    owner_id: &str,
    entry_id: &str,
) -> Result<Option<JournalEntry>, sqlx::Error> {
    let sql = format!("{} WHERE owner_id = $1 AND entry_id = $2", SELECT_COLUMNS);

    let row = sqlx::query_as::<_, StoredEntry>(&sql)
        .bind(owner_id)
        .bind(entry_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(StoredEntry::into_entry))
}

/// Write the fields present in `patch`.
///
/// Returns `false` if the entry does not exist.
pub async fn update_entry(
    pool: &PgPool,
    owner_id: &str,
    entry_id: &str,
    patch: &EntryPatch,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE journal_entries SET
            date = COALESCE($3, date),
            morning_energy = COALESCE($4, morning_energy),
            afternoon_energy = COALESCE($5, afternoon_energy),
            evening_energy = COALESCE($6, evening_energy),
            morning_focus = COALESCE($7, morning_focus),
            afternoon_moment = COALESCE($8, afternoon_moment),
            evening_emotion = COALESCE($9, evening_emotion),
            evening_authentic = COALESCE($10, evening_authentic),
            evening_acting = COALESCE($11, evening_acting),
            evening_admiration = COALESCE($12, evening_admiration)
        WHERE owner_id = $1 AND entry_id = $2
        "#,
    )
    .bind(owner_id)
    .bind(entry_id)
    .bind(&patch.date)
    .bind(patch.morning_energy)
    .bind(patch.afternoon_energy)
    .bind(patch.evening_energy)
    .bind(&patch.morning_focus)
    .bind(&patch.afternoon_moment)
    .bind(&patch.evening_emotion)
    .bind(&patch.evening_authentic)
    .bind(&patch.evening_acting)
    .bind(&patch.evening_admiration)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete an entry. Returns whether a row was removed.
pub async fn delete_entry(
    pool: &PgPool,
    owner_id: &str,
    entry_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM journal_entries WHERE owner_id = $1 AND entry_id = $2")
        .bind(owner_id)
        .bind(entry_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
