pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::recommendation::handlers::handle_recommend_formations;
use crate::state::AppState;
use crate::workflow::handlers::handle_evaluate;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Evaluation pipeline
        .route("/api/evaluate", post(handle_evaluate))
        // Course recommendation
        .route(
            "/api/recommend-formations",
            post(handle_recommend_formations),
        )
        .fallback(not_found)
        .with_state(state)
}
