use chrono::NaiveDateTime;
use sqlx::Row;

use crate::db::{Database, StoreError};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<UserRow>, StoreError> {
    let row = sqlx::query(
        "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(db.pool())
    .await?;

    row.map(|row| -> Result<UserRow, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    })
    .transpose()
    .map_err(StoreError::from)
}

pub async fn insert_user(
    db: &Database,
    id: &str,
    email: &str,
    password_hash: &str,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .execute(db.pool())
        .await?;
    Ok(())
}

pub async fn create_session(
    db: &Database,
    token_hash: &str,
    user_id: &str,
    expires_at: NaiveDateTime,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .execute(db.pool())
        .await?;
    Ok(())
}

/// Looks up a live session and returns its user id. Expired rows are treated
/// as absent and deleted opportunistically.
pub async fn find_session_user(
    db: &Database,
    token_hash: &str,
) -> Result<Option<String>, StoreError> {
    let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token_hash = $1")
        .bind(token_hash)
        .fetch_optional(db.pool())
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let expires_at: NaiveDateTime = row.try_get("expires_at").map_err(StoreError::from)?;
    if expires_at <= chrono::Utc::now().naive_utc() {
        let _ = delete_session(db, token_hash).await;
        return Ok(None);
    }

    Ok(Some(row.try_get("user_id").map_err(StoreError::from)?))
}

pub async fn delete_session(db: &Database, token_hash: &str) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(token_hash)
        .execute(db.pool())
        .await?;
    Ok(())
}
