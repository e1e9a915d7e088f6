use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::history::{self, AnalysisHistoryItem};
use crate::db::profiles::ProfileUpdate;
use crate::response::AppError;
use crate::routes::profile::{load_reconciled_profile, persist_optimistic, require_db};
use crate::services::ai_gateway::MessageAnalysis;
use crate::services::progression::{self, UserProgress, SCAN_XP_AWARD};
use crate::services::quota::{self, UsageKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub image_base64: String,
}

#[derive(Serialize)]
pub struct ScanResponse {
    success: bool,
    data: ScanData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScanData {
    analysis: MessageAnalysis,
    progress: UserProgress,
    leveled_up: bool,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    success: bool,
    data: Vec<AnalysisHistoryItem>,
}

/// Screenshot analysis: quota gate, one gateway call (no retry), then an
/// optimistic usage/XP/history update. The analysis result is returned even
/// if every follow-up write fails.
pub async fn scan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    if payload.image_base64.trim().is_empty() {
        return Err(AppError::validation("No image provided."));
    }

    let db = require_db(&state)?;
    let mut profile = load_reconciled_profile(db.as_ref(), &user).await?;

    let usage = UsageKind::Scan.count(&profile.progress);
    if quota::is_locked(profile.progress.is_premium, usage) {
        return Err(AppError::quota_exceeded(
            "Daily free scan used. Upgrade to ALPHA PRO for unlimited scans.",
        ));
    }

    let analysis = state.gateway().analyze_image(&payload.image_base64).await?;

    UsageKind::Scan.record(&mut profile.progress);
    let leveled_up = progression::grant_xp(&mut profile.progress, SCAN_XP_AWARD);

    persist_optimistic(
        db.as_ref(),
        &user.id,
        &ProfileUpdate::from_progress(&profile.progress),
    )
    .await;

    let item_id = Uuid::new_v4().to_string();
    if let Err(err) = history::push_history(
        db.as_ref(),
        &user.id,
        &item_id,
        &payload.image_base64,
        &analysis,
    )
    .await
    {
        tracing::warn!(error = %err, user_id = %user.id, "history persist failed");
    }

    Ok(Json(ScanResponse {
        success: true,
        data: ScanData {
            analysis,
            progress: profile.progress,
            leveled_up,
        },
    }))
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HistoryResponse>, AppError> {
    let db = require_db(&state)?;
    let items = history::list_history(db.as_ref(), &user.id).await?;
    Ok(Json(HistoryResponse {
        success: true,
        data: items,
    }))
}

pub async fn delete_history_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(item_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let db = require_db(&state)?;
    history::delete_history_item(db.as_ref(), &user.id, &item_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
