use std::sync::Arc;

use diesel_async::{AsyncPgConnection, pooled_connection::AsyncDieselConnectionManager};

use crate::config::Config;

pub type Pool = bb8::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

pub type Result<T> = std::result::Result<T, super::error::AppError>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: Pool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}
