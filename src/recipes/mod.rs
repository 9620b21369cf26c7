mod dto;
pub mod handlers;
pub mod query;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router(max_body: usize) -> Router<AppState> {
    handlers::routes(max_body)
}
