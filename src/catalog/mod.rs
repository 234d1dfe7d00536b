use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod stats;

pub fn router() -> Router<AppState> {
    handlers::catalog_routes()
}
