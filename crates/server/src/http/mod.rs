//! HTTP transport for the query pipeline

pub mod error;
pub mod routes;
pub mod state;

use axum::{routing::post, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use state::AppState;

/// Build the router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/query", post(routes::query))
        .route("/query-stream", post(routes::query_stream))
        .route("/feedback", post(routes::feedback))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
