//! HTTP surface of the member store.

pub mod app;
pub mod handlers;
pub mod problem;
pub mod state;

pub use app::build_router;
pub use problem::{ApiProblem, ApiResult};
pub use state::AppState;
