use sqlx::Row;

use crate::db::{Database, StoreError};
use crate::services::ai_gateway::MessageAnalysis;

/// Only the most recent analyses are kept per user.
pub const HISTORY_CAP: usize = 10;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisHistoryItem {
    pub id: String,
    pub timestamp: i64,
    pub image_base64: String,
    pub result: MessageAnalysis,
}

/// Ids past the cap, given the full list newest-first. These are the rows
/// to delete after an insert.
pub(crate) fn overflow_ids(mut ids_newest_first: Vec<String>) -> Vec<String> {
    if ids_newest_first.len() <= HISTORY_CAP {
        return Vec::new();
    }
    ids_newest_first.split_off(HISTORY_CAP)
}

pub async fn list_history(
    db: &Database,
    user_id: &str,
) -> Result<Vec<AnalysisHistoryItem>, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT id, image_base64, result, created_at
        FROM analysis_history
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(HISTORY_CAP as i64)
    .fetch_all(db.pool())
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let raw: serde_json::Value = row.try_get("result").map_err(StoreError::from)?;
        let Ok(result) = serde_json::from_value(raw) else {
            continue;
        };
        let created_at: chrono::NaiveDateTime =
            row.try_get("created_at").map_err(StoreError::from)?;
        items.push(AnalysisHistoryItem {
            id: row.try_get("id").map_err(StoreError::from)?,
            timestamp: created_at.and_utc().timestamp_millis(),
            image_base64: row.try_get("image_base64").map_err(StoreError::from)?,
            result,
        });
    }
    Ok(items)
}

/// Inserts the new item and prunes everything past the cap.
pub async fn push_history(
    db: &Database,
    user_id: &str,
    id: &str,
    image_base64: &str,
    result: &MessageAnalysis,
) -> Result<(), StoreError> {
    let raw = serde_json::to_value(result).unwrap_or_else(|_| serde_json::json!({}));
    sqlx::query(
        "INSERT INTO analysis_history (id, user_id, image_base64, result) VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(user_id)
    .bind(image_base64)
    .bind(raw)
    .execute(db.pool())
    .await?;

    let rows = sqlx::query(
        "SELECT id FROM analysis_history WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(db.pool())
    .await?;
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        ids.push(row.try_get::<String, _>("id").map_err(StoreError::from)?);
    }

    let stale = overflow_ids(ids);
    if !stale.is_empty() {
        sqlx::query("DELETE FROM analysis_history WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(&stale)
            .execute(db.pool())
            .await?;
    }

    Ok(())
}

pub async fn delete_history_item(
    db: &Database,
    user_id: &str,
    id: &str,
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM analysis_history WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .execute(db.pool())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("item-{i}")).collect()
    }

    #[test]
    fn test_under_cap_prunes_nothing() {
        assert!(overflow_ids(ids(3)).is_empty());
        assert!(overflow_ids(Vec::new()).is_empty());
    }

    #[test]
    fn test_exactly_at_cap_prunes_nothing() {
        assert!(overflow_ids(ids(HISTORY_CAP)).is_empty());
    }

    #[test]
    fn test_past_cap_drops_only_the_oldest() {
        let stale = overflow_ids(ids(HISTORY_CAP + 2));
        assert_eq!(stale, vec!["item-10".to_string(), "item-11".to_string()]);
    }
}
