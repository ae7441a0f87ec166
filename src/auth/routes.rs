use axum::{
    Router,
    routing::{get, post},
};

use super::handlers;
use crate::utils::types::AppState;

pub fn get_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/users", post(handlers::create_user))
        .route("/auth/users/me", get(handlers::get_current_user))
        .route("/auth/token/login", post(handlers::login_user))
}
