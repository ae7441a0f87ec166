use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, PoolError},
};

use crate::utils::types::Pool;

pub async fn get_pool(db_url: &str) -> Result<Pool, PoolError> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(db_url);
    let pool = bb8::Pool::builder().build(config).await?;

    tracing::debug!("database pool ready");
    Ok(pool)
}

/// A pool that opens connections on first use instead of at construction.
pub fn lazy_pool(db_url: &str) -> Pool {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(db_url);
    bb8::Pool::builder().build_unchecked(config)
}
