use axum::Router;

use crate::state::AppState;

mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod services;
pub mod tokens;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::account_routes())
}
