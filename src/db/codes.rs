use sqlx::Row;

use crate::db::{Database, StoreError};

#[derive(Debug, Clone)]
pub struct RedemptionCode {
    pub id: String,
    pub code: String,
    pub is_used: bool,
}

pub async fn find_code(db: &Database, code: &str) -> Result<Option<RedemptionCode>, StoreError> {
    let row = sqlx::query("SELECT id, code, is_used FROM redemption_codes WHERE code = $1")
        .bind(code)
        .fetch_optional(db.pool())
        .await?;

    row.map(|row| -> Result<RedemptionCode, sqlx::Error> {
        Ok(RedemptionCode {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            is_used: row.try_get("is_used")?,
        })
    })
    .transpose()
    .map_err(StoreError::from)
}

pub async fn mark_code_used(db: &Database, id: &str, user_id: &str) -> Result<(), StoreError> {
    sqlx::query("UPDATE redemption_codes SET is_used = TRUE, used_by = $1 WHERE id = $2")
        .bind(user_id)
        .bind(id)
        .execute(db.pool())
        .await?;
    Ok(())
}
