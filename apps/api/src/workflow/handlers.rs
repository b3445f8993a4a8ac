//! Axum route handlers for the Evaluation API.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::state::AppState;
use crate::workflow::{run_pipeline, PipelineInput, PipelineOutput};

/// POST /api/evaluate
///
/// Runs the evaluation pipeline for one employee profile in the requested mode.
/// Fields of stages the mode never reaches come back as empty strings.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(request): Json<PipelineInput>,
) -> Result<Json<PipelineOutput>, AppError> {
    if request.employee_json.trim().is_empty() {
        return Err(AppError::Validation(
            "employee_json cannot be empty".to_string(),
        ));
    }

    let output = run_pipeline(state.llm.as_ref(), request).await?;

    Ok(Json(output))
}
