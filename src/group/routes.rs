use axum::{
    Router,
    routing::{delete, get},
};

use super::handlers;
use crate::utils::types::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/groups/{group}/users",
            get(handlers::list_members).post(handlers::add_member),
        )
        .route("/groups/{group}/users/{id}", delete(handlers::remove_member))
}
