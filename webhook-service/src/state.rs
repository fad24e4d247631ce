//! Application state for the webhook service.

use std::sync::Arc;
use std::time::Duration;

use common::config::{AppConfig, DatabaseSettings};

use crate::executor::QueryExecutor;
use crate::pool_manager::{Connector, PoolManager};
use crate::strategy::StrategyRouter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub pool_manager: Arc<PoolManager>,
    pub router: Arc<StrategyRouter>,
}

impl AppState {
    /// Creates the state; the database pool itself is built on first use.
    pub fn new(config: AppConfig, settings: DatabaseSettings, connector: Arc<dyn Connector>) -> Self {
        let pool_manager = Arc::new(PoolManager::new(settings, connector));
        let executor = QueryExecutor::new(Duration::from_secs(config.query_timeout_secs));
        Self {
            router: Arc::new(StrategyRouter::new(pool_manager.clone(), executor)),
            pool_manager,
            config,
        }
    }
}
