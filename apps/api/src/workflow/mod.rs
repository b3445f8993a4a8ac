//! Evaluation pipeline: analyze → (generate tests) → score → validate → finalize.
//!
//! Each run owns a fresh `WorkflowState`; nothing is shared between runs.
//! The model is the only suspension point and stages never overlap.

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm_client::{LanguageModel, LlmError};
use crate::parsing::blueprint::parse_blueprint;
use crate::parsing::enrich::enrich_employee_json;

pub mod handlers;
pub mod prompts;
pub mod router;
pub mod stages;
pub mod state;

pub use router::{next_stage, route, Stage};
pub use state::{PipelineInput, PipelineOutput, WorkflowState};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The model call behind a stage failed. The run is abandoned, no retry.
    #[error("stage `{stage}` failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: LlmError,
    },
}

/// Runs one pipeline to completion.
///
/// Stages reached depend on `input.mode` (see [`router`]); the rest stay empty.
/// When a blueprint was produced, the input profile is also returned with the
/// parsed questions attached.
pub async fn run_pipeline(
    llm: &dyn LanguageModel,
    input: PipelineInput,
) -> Result<PipelineOutput, PipelineError> {
    let run_id = Uuid::new_v4();
    let mut state = WorkflowState::new(input);
    let mode = state.mode();

    info!(
        "Pipeline {run_id} started: mode={mode}, route={:?}",
        route(mode)
    );

    let mut current = Some(Stage::ENTRY);
    while let Some(stage) = current {
        info!("Pipeline {run_id}: running {stage}");

        let output = stages::run_stage(stage, &state, llm)
            .await
            .map_err(|source| {
                warn!("Pipeline {run_id}: {stage} failed: {source}");
                PipelineError::Stage { stage, source }
            })?;
        state.record(stage, output);

        current = next_stage(stage, mode);
    }

    let enriched = if state.test_blueprint().is_empty() {
        String::new()
    } else {
        let questions = parse_blueprint(state.test_blueprint());
        info!(
            "Pipeline {run_id}: blueprint yielded {} questions",
            questions.len()
        );
        enrich_employee_json(state.employee_json(), &questions)
    };

    info!(
        "Pipeline {run_id} finished: mode={mode}, final_output={} chars",
        state.final_output().len()
    );
    Ok(state.into_output(enriched))
}
