use axum::{Router, routing::get};

use super::handlers;
use crate::utils::types::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            get(handlers::list_orders).post(handlers::create_order),
        )
        .route(
            "/orders/{id}",
            get(handlers::get_order)
                .patch(handlers::patch_order)
                .delete(handlers::delete_order),
        )
}
