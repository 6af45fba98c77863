use std::sync::Arc;

use crate::{
    checkout::CheckoutSessions,
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
    live::ChangeHub,
    storage::ObjectStore,
    table::control::TableControls,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub hub: ChangeHub,
    pub storage: ObjectStore,
    pub checkouts: CheckoutSessions,
    pub tables: TableControls,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let orm = orm_from_pool(&pool);
        let storage = ObjectStore::new(config.storage_dir.clone(), config.public_base_url.clone());
        Self {
            pool,
            orm,
            config: Arc::new(config),
            hub: ChangeHub::default(),
            storage,
            checkouts: CheckoutSessions::new(),
            tables: TableControls::default(),
        }
    }
}
