//! Shared application state

use sqlx::PgPool;
use std::sync::Arc;

use opsbooks_billing::InvoiceGenerator;

use crate::config::Config;

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: PgPool,
    pub invoicer: Arc<InvoiceGenerator>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let invoicer = InvoiceGenerator::from_env(pool.clone());
        Self {
            config: Arc::new(config),
            pool,
            invoicer: Arc::new(invoicer),
        }
    }
}
