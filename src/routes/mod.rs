mod analyzer;
mod auth;
mod coach;
mod health;
mod premium;
mod profile;
mod quests;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::middleware::auth::require_auth;
use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/profile", get(profile::get_profile))
        .route("/api/v1/profile", patch(profile::update_profile))
        .route("/api/v1/profile/onboarding", post(profile::finish_onboarding))
        .route("/api/v1/quests", get(quests::get_quests))
        .route("/api/v1/quests/:quest_id/complete", post(quests::complete_quest))
        .route("/api/v1/analyzer/scan", post(analyzer::scan))
        .route("/api/v1/analyzer/history", get(analyzer::get_history))
        .route(
            "/api/v1/analyzer/history/:item_id",
            delete(analyzer::delete_history_item),
        )
        .route("/api/v1/coach/advice", post(coach::advice))
        .route("/api/v1/premium/redeem", post(premium::redeem))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/verify", get(auth::verify))
        .route("/api/v1/auth/logout", post(auth::logout))
        .merge(protected)
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found.").into_response()
}
