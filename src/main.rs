use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use alphatalk_backend::config::Config;
use alphatalk_backend::db::Database;
use alphatalk_backend::logging;
use alphatalk_backend::routes;
use alphatalk_backend::services::ai_gateway::AiGateway;
use alphatalk_backend::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config);
    let addr = config.bind_addr();

    let db = match Database::from_env().await {
        Ok(db) => {
            if !config.skip_schema_bootstrap {
                if let Err(err) = db.bootstrap_schema().await {
                    tracing::warn!(error = %err, "schema bootstrap failed");
                }
            }
            Some(Arc::new(db))
        }
        Err(err) => {
            tracing::warn!(error = %err, "database not initialized");
            None
        }
    };

    let gateway = AiGateway::new(&config);
    if !gateway.is_available() {
        tracing::warn!("AI gateway not configured, analysis and coaching will be unavailable");
    }

    let state = AppState::new(config, db, gateway);

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!(%addr, "alphatalk-backend listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    if let Err(e) = server.await {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
