use sqlx::postgres::PgRow;
use sqlx::{QueryBuilder, Row};

use crate::db::{Database, StoreError};
use crate::services::progression::UserProgress;
use crate::services::quests::Quest;

/// Partial update of a profile row. This is the single place where the
/// camelCase in-memory fields map onto snake_case columns; handlers never
/// name a column directly.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub level: Option<i32>,
    pub xp: Option<i32>,
    pub max_xp: Option<i32>,
    pub streak: Option<i32>,
    pub tokens: Option<i32>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub daily_scans: Option<i32>,
    pub daily_coach_uses: Option<i32>,
    pub usage_date: Option<String>,
    pub has_seen_onboarding: Option<bool>,
}

impl ProfileUpdate {
    /// Everything the progression/quota flows mutate, taken from the
    /// in-memory state after an optimistic update.
    pub fn from_progress(progress: &UserProgress) -> Self {
        Self {
            level: Some(progress.level),
            xp: Some(progress.xp),
            max_xp: Some(progress.max_xp),
            streak: Some(progress.streak),
            tokens: Some(progress.tokens),
            daily_scans: Some(progress.daily_scans),
            daily_coach_uses: Some(progress.daily_coach_uses),
            usage_date: Some(progress.usage_date.clone()),
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.level.is_none()
            && self.xp.is_none()
            && self.max_xp.is_none()
            && self.streak.is_none()
            && self.tokens.is_none()
            && self.name.is_none()
            && self.avatar_url.is_none()
            && self.daily_scans.is_none()
            && self.daily_coach_uses.is_none()
            && self.usage_date.is_none()
            && self.has_seen_onboarding.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct StoredProfile {
    pub progress: UserProgress,
    pub has_seen_onboarding: bool,
}

fn row_to_profile(row: &PgRow, today: &str) -> Result<StoredProfile, sqlx::Error> {
    let progress = UserProgress {
        level: row.try_get("level")?,
        xp: row.try_get("xp")?,
        max_xp: row.try_get("max_xp")?,
        streak: row.try_get("streak")?,
        tokens: row.try_get("tokens")?,
        is_premium: row.try_get("is_premium")?,
        name: row.try_get("name")?,
        avatar_url: row.try_get("avatar_url")?,
        daily_scans: row.try_get("daily_scans")?,
        daily_coach_uses: row.try_get("daily_coach_uses")?,
        usage_date: row
            .try_get::<Option<String>, _>("usage_date")?
            .unwrap_or_else(|| today.to_string()),
    };
    Ok(StoredProfile {
        progress,
        has_seen_onboarding: row.try_get("has_seen_onboarding")?,
    })
}

pub async fn get_profile(
    db: &Database,
    user_id: &str,
    today: &str,
) -> Result<Option<StoredProfile>, StoreError> {
    let row = sqlx::query(
        r#"
        SELECT level, xp, max_xp, streak, tokens, is_premium, name, avatar_url,
               daily_scans, daily_coach_uses, usage_date, has_seen_onboarding
        FROM profiles WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db.pool())
    .await?;

    match row {
        Some(row) => Ok(Some(row_to_profile(&row, today).map_err(StoreError::from)?)),
        None => Ok(None),
    }
}

pub async fn create_profile(
    db: &Database,
    user_id: &str,
    email: &str,
    progress: &UserProgress,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO profiles (
            id, email, name, level, xp, max_xp, streak, tokens, is_premium,
            daily_scans, daily_coach_uses, usage_date, quests, quests_date, last_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, '[]'::jsonb, NULL, now())
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(&progress.name)
    .bind(progress.level)
    .bind(progress.xp)
    .bind(progress.max_xp)
    .bind(progress.streak)
    .bind(progress.tokens)
    .bind(progress.is_premium)
    .bind(progress.daily_scans)
    .bind(progress.daily_coach_uses)
    .bind(&progress.usage_date)
    .execute(db.pool())
    .await?;
    Ok(())
}

pub async fn update_profile(
    db: &Database,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<(), StoreError> {
    if update.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<sqlx::Postgres> =
        QueryBuilder::new("UPDATE profiles SET last_active = now()");
    if let Some(level) = update.level {
        builder.push(", level = ").push_bind(level);
    }
    if let Some(xp) = update.xp {
        builder.push(", xp = ").push_bind(xp);
    }
    if let Some(max_xp) = update.max_xp {
        builder.push(", max_xp = ").push_bind(max_xp);
    }
    if let Some(streak) = update.streak {
        builder.push(", streak = ").push_bind(streak);
    }
    if let Some(tokens) = update.tokens {
        builder.push(", tokens = ").push_bind(tokens);
    }
    if let Some(ref name) = update.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(ref avatar_url) = update.avatar_url {
        builder.push(", avatar_url = ").push_bind(avatar_url);
    }
    if let Some(daily_scans) = update.daily_scans {
        builder.push(", daily_scans = ").push_bind(daily_scans);
    }
    if let Some(daily_coach_uses) = update.daily_coach_uses {
        builder.push(", daily_coach_uses = ").push_bind(daily_coach_uses);
    }
    if let Some(ref usage_date) = update.usage_date {
        builder.push(", usage_date = ").push_bind(usage_date);
    }
    if let Some(seen) = update.has_seen_onboarding {
        builder.push(", has_seen_onboarding = ").push_bind(seen);
    }
    builder.push(" WHERE id = ").push_bind(user_id);

    builder.build().execute(db.pool()).await?;
    Ok(())
}

/// Only the premium flow writes this flag; client-supplied updates cannot
/// touch it because `ProfileUpdate` has no premium field.
pub async fn set_premium(db: &Database, user_id: &str) -> Result<(), StoreError> {
    sqlx::query("UPDATE profiles SET is_premium = TRUE WHERE id = $1")
        .bind(user_id)
        .execute(db.pool())
        .await?;
    Ok(())
}

pub async fn get_stored_quests(
    db: &Database,
    user_id: &str,
) -> Result<(Vec<Quest>, Option<String>), StoreError> {
    let row = sqlx::query("SELECT quests, quests_date FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db.pool())
        .await?;

    let Some(row) = row else {
        return Ok((Vec::new(), None));
    };

    let raw: serde_json::Value = row.try_get("quests").map_err(StoreError::from)?;
    let quests = serde_json::from_value(raw).unwrap_or_default();
    let date: Option<String> = row.try_get("quests_date").map_err(StoreError::from)?;
    Ok((quests, date))
}

pub async fn save_stored_quests(
    db: &Database,
    user_id: &str,
    quests: &[Quest],
    date: &str,
) -> Result<(), StoreError> {
    let raw = serde_json::to_value(quests).unwrap_or_else(|_| serde_json::json!([]));
    sqlx::query("UPDATE profiles SET quests = $1, quests_date = $2 WHERE id = $3")
        .bind(raw)
        .bind(date)
        .bind(user_id)
        .execute(db.pool())
        .await?;
    Ok(())
}
