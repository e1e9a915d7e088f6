use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Datelike;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::db::profiles::{self, ProfileUpdate};
use crate::response::AppError;
use crate::routes::profile::{load_reconciled_profile, persist_optimistic, require_db};
use crate::services::progression::{self, UserProgress};
use crate::services::quests::{self, Quest};
use crate::services::quota;
use crate::state::AppState;

#[derive(Serialize)]
pub struct QuestsResponse {
    success: bool,
    data: QuestsData,
}

#[derive(Serialize)]
struct QuestsData {
    quests: Vec<Quest>,
    date: String,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    success: bool,
    data: CompleteData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteData {
    quests: Vec<Quest>,
    progress: UserProgress,
    xp_awarded: i32,
    leveled_up: bool,
}

/// Returns today's quest set. A stored set from today is reused so completed
/// state survives a reload; anything older is replaced by a fresh set.
pub async fn get_quests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<QuestsResponse>, AppError> {
    let db = require_db(&state)?;
    let today = quota::today_string();

    // Guarantees the profile row exists and the daily counters are current
    // before the quest set is read or rewritten.
    load_reconciled_profile(db.as_ref(), &user).await?;

    let (stored, stored_date) = profiles::get_stored_quests(db.as_ref(), &user.id).await?;
    if quests::set_is_current(stored_date.as_deref(), &today, &stored) {
        return Ok(Json(QuestsResponse {
            success: true,
            data: QuestsData {
                quests: stored,
                date: today,
            },
        }));
    }

    let day_of_month = chrono::Utc::now().day();
    let fresh = quests::generate_daily_quests(day_of_month);

    if let Err(err) = profiles::save_stored_quests(db.as_ref(), &user.id, &fresh, &today).await {
        tracing::warn!(error = %err, user_id = %user.id, "quest set persist failed");
    }

    Ok(Json(QuestsResponse {
        success: true,
        data: QuestsData {
            quests: fresh,
            date: today,
        },
    }))
}

/// Marks a quest complete and forwards its reward to the progression engine.
/// Unknown or already-completed ids are a no-op that never grants twice.
pub async fn complete_quest(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(quest_id): Path<String>,
) -> Result<Json<CompleteResponse>, AppError> {
    let db = require_db(&state)?;
    let today = quota::today_string();

    let (mut stored, stored_date) = profiles::get_stored_quests(db.as_ref(), &user.id).await?;
    if !quests::set_is_current(stored_date.as_deref(), &today, &stored) {
        return Err(AppError::not_found("No quest set for today."));
    }

    let mut profile = load_reconciled_profile(db.as_ref(), &user).await?;

    let (xp_awarded, leveled_up) = match quests::complete_quest(&mut stored, &quest_id) {
        Some(xp) => {
            let leveled = progression::grant_xp(&mut profile.progress, xp);

            if let Err(err) =
                profiles::save_stored_quests(db.as_ref(), &user.id, &stored, &today).await
            {
                tracing::warn!(error = %err, user_id = %user.id, "quest set persist failed");
            }
            persist_optimistic(
                db.as_ref(),
                &user.id,
                &ProfileUpdate::from_progress(&profile.progress),
            )
            .await;

            (xp, leveled)
        }
        None => (0, false),
    };

    Ok(Json(CompleteResponse {
        success: true,
        data: CompleteData {
            quests: stored,
            progress: profile.progress,
            xp_awarded,
            leveled_up,
        },
    }))
}
