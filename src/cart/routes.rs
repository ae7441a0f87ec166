use axum::{Router, routing::get};

use super::handlers;
use crate::utils::types::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new().route(
        "/cart/menu-items",
        get(handlers::get_cart)
            .post(handlers::add_to_cart)
            .delete(handlers::clear_cart),
    )
}
