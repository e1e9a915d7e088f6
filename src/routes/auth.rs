use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{profiles, users};
use crate::response::AppError;
use crate::routes::profile::DEFAULT_AGENT_NAME;
use crate::services::progression::UserProgress;
use crate::services::quota;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    success: bool,
    data: AuthData,
}

#[derive(Serialize)]
struct AuthData {
    user: AuthUserSummary,
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthUserSummary {
    id: String,
    email: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    success: bool,
    message: &'static str,
}

/// Local checks run before any I/O; a malformed request never touches the
/// store.
fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.trim().is_empty() {
        return Err(AppError::validation("Email is required."));
    }
    if !email.contains('@') {
        return Err(AppError::validation("Email looks invalid."));
    }
    if password.is_empty() {
        return Err(AppError::validation("Password is required."));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    validate_credentials(&payload.email, &payload.password)?;

    let db = crate::routes::profile::require_db(&state)?;
    let email = payload.email.trim().to_lowercase();

    if users::find_by_email(db.as_ref(), &email).await?.is_some() {
        return Err(AppError::conflict("This email is already registered."));
    }

    let password_hash = bcrypt::hash(&payload.password, 10)
        .map_err(|err| {
            tracing::warn!(error = %err, "password hash failed");
            AppError::internal("Internal server error.")
        })?;

    let user_id = Uuid::new_v4().to_string();
    users::insert_user(db.as_ref(), &user_id, &email, &password_hash).await?;

    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_AGENT_NAME);
    let progress = UserProgress::initial(name, &quota::today_string());
    profiles::create_profile(db.as_ref(), &user_id, &email, &progress).await?;

    let config = state.config();
    let token = issue_session(db.as_ref(), config.as_ref(), &user_id, &email).await?;

    Ok(Json(AuthResponse {
        success: true,
        data: AuthData {
            user: AuthUserSummary { id: user_id, email },
            token,
        },
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    validate_credentials(&payload.email, &payload.password)?;

    let db = crate::routes::profile::require_db(&state)?;
    let email = payload.email.trim().to_lowercase();

    let Some(user) = users::find_by_email(db.as_ref(), &email).await? else {
        return Err(AppError::unauthorized("Email or password is incorrect."));
    };

    let password_ok = bcrypt::verify(&payload.password, &user.password_hash).unwrap_or(false);
    if !password_ok {
        return Err(AppError::unauthorized("Email or password is incorrect."));
    }

    let config = state.config();
    let token = issue_session(db.as_ref(), config.as_ref(), &user.id, &user.email).await?;

    Ok(Json(AuthResponse {
        success: true,
        data: AuthData {
            user: AuthUserSummary {
                id: user.id,
                email: user.email,
            },
            token,
        },
    }))
}

pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = crate::auth::extract_token(&headers)
        .ok_or_else(|| AppError::unauthorized("No auth token provided."))?;
    let db = crate::routes::profile::require_db(&state)?;

    let config = state.config();
    let user = crate::auth::verify_request_token(db.as_ref(), config.as_ref(), &token)
        .await
        .map_err(|_| AppError::unauthorized("Authentication failed. Sign in again."))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "user": user }
    })))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, AppError> {
    let token = crate::auth::extract_token(&headers)
        .ok_or_else(|| AppError::unauthorized("No auth token provided."))?;
    let db = crate::routes::profile::require_db(&state)?;

    let token_hash = crate::auth::hash_token(&token);
    users::delete_session(db.as_ref(), &token_hash).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Signed out.",
    }))
}

async fn issue_session(
    db: &crate::db::Database,
    config: &crate::config::Config,
    user_id: &str,
    email: &str,
) -> Result<String, AppError> {
    let (token, expires_at) = crate::auth::sign_jwt_for_user(config, user_id, email).map_err(|err| {
        tracing::error!(error = %err, "token signing failed");
        AppError::internal("Internal server error.")
    })?;

    let token_hash = crate::auth::hash_token(&token);
    users::create_session(db, &token_hash, user_id, expires_at).await?;

    Ok(token)
}
