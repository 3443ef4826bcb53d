pub mod handlers;

pub use handlers::*;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/reconcile", post(reconcile))
        .route("/api/reconcile/stored", post(reconcile_stored))
        .layer(ServiceBuilder::new())
        .with_state(state)
}
