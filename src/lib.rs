use axum::Router;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub mod access;
pub mod auth;
pub mod cart;
pub mod category;
pub mod config;
pub mod group;
pub mod menu_item;
pub mod order;
pub mod pool;
pub mod schema;
pub mod utils;

use utils::types::AppState;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn establish_connection(db_url: &str) -> ConnectionResult<PgConnection> {
    PgConnection::establish(db_url)
}

/// Applies pending embedded migrations over a blocking connection.
pub fn run_migrations(db_url: &str) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = establish_connection(db_url)?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    Ok(applied.len())
}

/// The full HTTP surface, mounted under `/api`.
pub fn app(state: AppState) -> Router {
    let routes = Router::new()
        .merge(auth::routes::get_routes())
        .merge(category::routes::get_routes())
        .merge(menu_item::routes::get_routes())
        .merge(group::routes::get_routes())
        .merge(cart::routes::get_routes())
        .merge(order::routes::get_routes())
        .with_state(state);

    Router::new()
        .nest("/api", routes)
        .fallback(utils::handler_404)
}
