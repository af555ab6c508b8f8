use axum::{routing::get, Router};

use crate::handlers::{get_member_username, healthcheck, list_member_dtos, list_members};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/members", get(list_members))
        .route("/members/dto", get(list_member_dtos))
        .route("/members/{id}", get(get_member_username))
        .with_state(state)
}
