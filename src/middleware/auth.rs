use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::response::json_error;
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = crate::auth::extract_token(req.headers());
    let Some(token) = token else {
        return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "No auth token provided.")
            .into_response();
    };

    let Some(db) = state.db() else {
        return json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database unavailable.",
        )
        .into_response();
    };

    let config = state.config();
    match crate::auth::verify_request_token(db.as_ref(), config.as_ref(), &token).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(_err) => json_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Authentication failed. Sign in again.",
        )
        .into_response(),
    }
}
