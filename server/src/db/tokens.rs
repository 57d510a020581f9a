//! Database operations for the api_tokens table.

use sqlx::PgPool;

/// Resolve a bearer token to its owner.
pub async fn find_token_owner(pool: &PgPool, token: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT owner_id FROM api_tokens WHERE token = $1")
        .bind(token)
        .fetch_optional(pool)
        .await
}

/// Issue a new random token for an owner.
pub async fn create_token(pool: &PgPool, owner_id: &str) -> Result<String, sqlx::Error> {
    let token = uuid::Uuid::new_v4().simple().to_string();

    sqlx::query("INSERT INTO api_tokens (token, owner_id, created_at) VALUES ($1, $2, $3)")
        .bind(&token)
        .bind(owner_id)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(pool)
        .await?;

    Ok(token)
}
