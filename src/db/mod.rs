pub mod codes;
pub mod history;
pub mod profiles;
pub mod users;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

const PG_UNDEFINED_TABLE: &str = "42P01";
const PG_INSUFFICIENT_PRIVILEGE: &str = "42501";

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error("DATABASE_URL is not set")]
    MissingUrl,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Store-level failure taxonomy. A missing table is a setup problem the user
/// has to fix (run the schema), not a transient fault, and is surfaced as its
/// own category end to end.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("required table is missing")]
    TableMissing,
    #[error("permission denied by the store")]
    PermissionDenied,
    #[error("row not found")]
    NotFound,
    #[error("database error: {0}")]
    Unknown(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return StoreError::NotFound;
        }
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.to_string());
        match code.as_deref() {
            Some(PG_UNDEFINED_TABLE) => StoreError::TableMissing,
            Some(PG_INSUFFICIENT_PRIVILEGE) => StoreError::PermissionDenied,
            _ => StoreError::Unknown(err),
        }
    }
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn from_env() -> Result<Self, DbInitError> {
        let url = std::env::var("DATABASE_URL").map_err(|_| DbInitError::MissingUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the tables this service owns. Idempotent; skipped when
    /// `SKIP_SCHEMA_BOOTSTRAP` is set (hosted deployments manage schema
    /// themselves, which is how a missing table can still happen at runtime).
    pub async fn bootstrap_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token_hash TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id),
        expires_at TIMESTAMP NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY REFERENCES users(id),
        email TEXT NOT NULL,
        name TEXT NOT NULL,
        avatar_url TEXT,
        level INT NOT NULL DEFAULT 1,
        xp INT NOT NULL DEFAULT 0,
        max_xp INT NOT NULL DEFAULT 100,
        streak INT NOT NULL DEFAULT 1,
        tokens INT NOT NULL DEFAULT 5,
        is_premium BOOLEAN NOT NULL DEFAULT FALSE,
        daily_scans INT NOT NULL DEFAULT 0,
        daily_coach_uses INT NOT NULL DEFAULT 0,
        usage_date TEXT,
        quests JSONB NOT NULL DEFAULT '[]'::jsonb,
        quests_date TEXT,
        has_seen_onboarding BOOLEAN NOT NULL DEFAULT FALSE,
        last_active TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS analysis_history (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id),
        image_base64 TEXT NOT NULL,
        result JSONB NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS redemption_codes (
        id TEXT PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        is_used BOOLEAN NOT NULL DEFAULT FALSE,
        used_by TEXT
    )
    "#,
];
