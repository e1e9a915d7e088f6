use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::profiles::ProfileUpdate;
use crate::response::AppError;
use crate::routes::profile::{load_reconciled_profile, persist_optimistic, require_db};
use crate::services::ai_gateway::CoachingGoal;
use crate::services::progression::{self, UserProgress, COACH_XP_AWARD};
use crate::services::quota::{self, UsageKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    pub text: String,
    pub goal: CoachingGoal,
    pub context: Option<String>,
}

#[derive(Serialize)]
pub struct AdviceResponse {
    success: bool,
    data: AdviceData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdviceData {
    advice: String,
    progress: UserProgress,
    leveled_up: bool,
}

pub async fn advice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AdviceRequest>,
) -> Result<Json<AdviceResponse>, AppError> {
    if payload.text.trim().is_empty() {
        return Err(AppError::validation("No message to coach."));
    }

    let db = require_db(&state)?;
    let mut profile = load_reconciled_profile(db.as_ref(), &user).await?;

    let usage = UsageKind::Coach.count(&profile.progress);
    if quota::is_locked(profile.progress.is_premium, usage) {
        return Err(AppError::quota_exceeded(
            "Daily free coaching used. Upgrade to ALPHA PRO for unlimited coaching.",
        ));
    }

    let advice = state
        .gateway()
        .coaching_advice(&payload.text, payload.goal, payload.context.as_deref())
        .await?;

    UsageKind::Coach.record(&mut profile.progress);
    let leveled_up = progression::grant_xp(&mut profile.progress, COACH_XP_AWARD);

    persist_optimistic(
        db.as_ref(),
        &user.id,
        &ProfileUpdate::from_progress(&profile.progress),
    )
    .await;

    Ok(Json(AdviceResponse {
        success: true,
        data: AdviceData {
            advice,
            progress: profile.progress,
            leveled_up,
        },
    }))
}
