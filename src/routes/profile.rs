use std::sync::Arc;

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::profiles::{self, ProfileUpdate, StoredProfile};
use crate::db::Database;
use crate::response::AppError;
use crate::services::progression::UserProgress;
use crate::services::quota;
use crate::state::AppState;

pub const DEFAULT_AGENT_NAME: &str = "Agent";

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: ProfileData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub progress: UserProgress,
    pub has_seen_onboarding: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

pub(crate) fn require_db(state: &AppState) -> Result<Arc<Database>, AppError> {
    state
        .db()
        .ok_or_else(|| AppError::service_unavailable("Database unavailable."))
}

/// Loads the caller's profile, creating the initial row on first sight and
/// running the daily quota reconciliation before anything reads the
/// counters. A reset is persisted immediately; a failed persist keeps the
/// reset in memory (last write wins on the next mutation).
pub(crate) async fn load_reconciled_profile(
    db: &Database,
    user: &AuthUser,
) -> Result<StoredProfile, AppError> {
    let today = quota::today_string();

    let mut stored = match profiles::get_profile(db, &user.id, &today).await? {
        Some(stored) => stored,
        None => {
            let progress = UserProgress::initial(DEFAULT_AGENT_NAME, &today);
            profiles::create_profile(db, &user.id, &user.email, &progress).await?;
            StoredProfile {
                progress,
                has_seen_onboarding: false,
            }
        }
    };

    if quota::reconcile_date(&mut stored.progress, &today) {
        let update = ProfileUpdate {
            daily_scans: Some(0),
            daily_coach_uses: Some(0),
            usage_date: Some(today),
            ..ProfileUpdate::default()
        };
        persist_optimistic(db, &user.id, &update).await;
    }

    Ok(stored)
}

/// Optimistic write: the in-memory state the caller already holds is the
/// truth for this response; a store failure is logged and swallowed.
pub(crate) async fn persist_optimistic(db: &Database, user_id: &str, update: &ProfileUpdate) {
    if let Err(err) = profiles::update_profile(db, user_id, update).await {
        tracing::warn!(error = %err, user_id, "profile persist failed, keeping in-memory state");
    }
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>, AppError> {
    let db = require_db(&state)?;
    let stored = load_reconciled_profile(db.as_ref(), &user).await?;

    Ok(Json(ProfileResponse {
        success: true,
        data: ProfileData {
            progress: stored.progress,
            has_seen_onboarding: stored.has_seen_onboarding,
        },
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    if let Some(ref name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::validation("Name cannot be empty."));
        }
    }

    let db = require_db(&state)?;
    let mut stored = load_reconciled_profile(db.as_ref(), &user).await?;

    if let Some(name) = payload.name.clone() {
        stored.progress.name = name;
    }
    if let Some(avatar_url) = payload.avatar_url.clone() {
        stored.progress.avatar_url = Some(avatar_url);
    }

    let update = ProfileUpdate {
        name: payload.name,
        avatar_url: payload.avatar_url,
        ..ProfileUpdate::default()
    };
    persist_optimistic(db.as_ref(), &user.id, &update).await;

    Ok(Json(ProfileResponse {
        success: true,
        data: ProfileData {
            progress: stored.progress,
            has_seen_onboarding: stored.has_seen_onboarding,
        },
    }))
}

pub async fn finish_onboarding(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = require_db(&state)?;

    let update = ProfileUpdate {
        has_seen_onboarding: Some(true),
        ..ProfileUpdate::default()
    };
    persist_optimistic(db.as_ref(), &user.id, &update).await;

    Ok(Json(serde_json::json!({ "success": true })))
}
