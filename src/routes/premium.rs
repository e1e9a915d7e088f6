use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::response::AppError;
use crate::routes::profile::require_db;
use crate::services::premium::{self, RedeemOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

/// Rejections (bad code, used code) come back as 200 with success=false so
/// the client can show the message inline; store failures use the normal
/// error taxonomy.
pub async fn redeem(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RedeemRequest>,
) -> Result<Json<RedeemOutcome>, AppError> {
    let db = require_db(&state)?;
    let config = state.config();
    let outcome = premium::redeem_code(db.as_ref(), config.as_ref(), &user.id, &payload.code).await?;
    Ok(Json(outcome))
}
