use sqlx::SqlitePool;

use crate::{config::Config, flow::FlowStore};

pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub flows: FlowStore,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let flows = FlowStore::new(config.flow_ttl);
        Self { pool, config, flows }
    }
}
