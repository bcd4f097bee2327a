pub mod health;
pub mod reports;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(reports::router())
        .nest("/api", crate::openapi::router())
        .with_state(state)
}
