use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::db::Database;
use crate::services::ai_gateway::AiGateway;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    config: Arc<Config>,
    db: Option<Arc<Database>>,
    gateway: Arc<AiGateway>,
}

impl AppState {
    pub fn new(config: Config, db: Option<Arc<Database>>, gateway: AiGateway) -> Self {
        Self {
            started_at: Instant::now(),
            config: Arc::new(config),
            db,
            gateway: Arc::new(gateway),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    pub fn db(&self) -> Option<Arc<Database>> {
        self.db.clone()
    }

    pub fn gateway(&self) -> Arc<AiGateway> {
        Arc::clone(&self.gateway)
    }
}
