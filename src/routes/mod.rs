use crate::state::AppState;
use axum::Router;

pub mod docs;
pub mod health;
pub mod waitlist;

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .merge(health::create_router())
        .merge(waitlist::create_router())
        .merge(docs::create_router())
        .merge(crate::metrics::create_router())
        .with_state(app_state)
}
