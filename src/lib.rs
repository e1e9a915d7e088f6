pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::ai_gateway::AiGateway;
use crate::state::AppState;

pub async fn create_app() -> axum::Router {
    let config = config::Config::from_env();

    let db = match db::Database::from_env().await {
        Ok(db) => Some(Arc::new(db)),
        Err(_) => None,
    };

    let gateway = AiGateway::new(&config);
    let state = AppState::new(config, db, gateway);

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
