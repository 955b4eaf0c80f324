//! HTTP route handlers.

pub mod health;
pub mod listing;

use axum::Router;

use crate::state::AppState;

/// All application routes, without middleware layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(listing::router())
}
