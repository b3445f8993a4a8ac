//! Axum route handlers for the Recommendation API.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::recommendation::{recommend_courses, CourseRecommendation};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    /// The evaluated employee JSON (`final_output` of an evaluation run).
    pub final_output: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub formations: Vec<CourseRecommendation>,
}

/// POST /api/recommend-formations
///
/// Searches for training courses that close the employee's largest gaps.
/// Runs on its own task; an unusable model answer yields an empty list.
pub async fn handle_recommend_formations(
    State(state): State<AppState>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    if request.final_output.trim().is_empty() {
        return Err(AppError::Validation(
            "final_output cannot be empty".to_string(),
        ));
    }

    let llm = Arc::clone(&state.llm);
    let formations = tokio::spawn(async move {
        recommend_courses(llm.as_ref(), &request.final_output).await
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Recommendation task failed: {e}")))?;

    Ok(Json(RecommendResponse { formations }))
}
