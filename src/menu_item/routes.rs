use axum::{Router, routing::get};

use super::handlers;
use crate::utils::types::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/menu-items/",
            get(handlers::get_menu_items).post(handlers::create_menu_item),
        )
        .route(
            "/menu-items",
            get(handlers::get_menu_items).post(handlers::create_menu_item),
        )
        .route(
            "/menu-items/{id}",
            get(handlers::get_menu_item_by_id)
                .put(handlers::replace_menu_item)
                .patch(handlers::update_menu_item)
                .delete(handlers::delete_menu_item),
        )
}
