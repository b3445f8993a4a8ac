//! Stage runners — build each stage's prompt from the state, call the model,
//! and normalize the answer. Routing lives in `router`; storage in `state`.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::llm_client::{LanguageModel, LlmError};
use crate::parsing::enrich::competence_id;
use crate::parsing::fences::strip_json_fences;
use crate::workflow::prompts::{
    render, score_real_system, score_simulated_system, ANALYZE_PROMPT_TEMPLATE, ANALYZE_SYSTEM,
    FINALIZE_PROMPT_TEMPLATE, FINALIZE_SYSTEM, GENERATE_TESTS_PROMPT_TEMPLATE,
    GENERATE_TESTS_SYSTEM, SCORE_REAL_PROMPT_TEMPLATE, SCORE_SIMULATED_PROMPT_TEMPLATE,
    VALIDATE_PROMPT_TEMPLATE, VALIDATE_SYSTEM,
};
use crate::workflow::router::Stage;
use crate::workflow::state::{TestScores, WorkflowState};

/// Runs `stage` against the current state and returns the text that stage owns.
pub async fn run_stage(
    stage: Stage,
    state: &WorkflowState,
    llm: &dyn LanguageModel,
) -> Result<String, LlmError> {
    let (system, prompt) = build_prompt(stage, state)?;
    let raw = llm.complete(&system, &prompt).await?;
    debug!("Stage {stage} returned {} chars", raw.len());

    let output = match stage {
        Stage::Analyze | Stage::GenerateTests => raw,
        Stage::Score | Stage::Validate => strip_json_fences(&raw).to_string(),
        Stage::Finalize => {
            let final_output = strip_json_fences(&raw);
            if state.test_scores().is_empty() {
                final_output.to_string()
            } else {
                pin_test_scores(final_output, state.test_scores())
            }
        }
    };

    Ok(output)
}

/// Returns `(system, user)` for a stage.
fn build_prompt(stage: Stage, state: &WorkflowState) -> Result<(String, String), LlmError> {
    let employee_json = ("employee_json", state.employee_json());
    let analysis = ("analysis", state.analysis());

    let pair = match stage {
        Stage::Analyze => (
            ANALYZE_SYSTEM.to_string(),
            render(ANALYZE_PROMPT_TEMPLATE, &[employee_json]),
        ),
        Stage::GenerateTests => (
            GENERATE_TESTS_SYSTEM.to_string(),
            render(GENERATE_TESTS_PROMPT_TEMPLATE, &[employee_json, analysis]),
        ),
        Stage::Score if !state.test_scores().is_empty() => {
            let scores = serde_json::to_string(state.test_scores())?;
            (
                score_real_system(),
                render(
                    SCORE_REAL_PROMPT_TEMPLATE,
                    &[employee_json, analysis, ("test_scores", scores.as_str())],
                ),
            )
        }
        Stage::Score => (
            score_simulated_system(),
            render(
                SCORE_SIMULATED_PROMPT_TEMPLATE,
                &[
                    employee_json,
                    analysis,
                    ("test_blueprint", state.test_blueprint()),
                ],
            ),
        ),
        Stage::Validate => (
            VALIDATE_SYSTEM.to_string(),
            render(
                VALIDATE_PROMPT_TEMPLATE,
                &[
                    employee_json,
                    ("evaluation_results", state.evaluation_results()),
                ],
            ),
        ),
        Stage::Finalize => (
            FINALIZE_SYSTEM.to_string(),
            render(
                FINALIZE_PROMPT_TEMPLATE,
                &[
                    employee_json,
                    ("validated_results", state.validated_results()),
                ],
            ),
        ),
    };

    Ok(pair)
}

/// Forces `_metadata_evaluation.score_test` to the caller's score for every
/// competence listed in `scores`.
///
/// The model is told to copy the scores verbatim but nothing guarantees it. Output
/// that is not a profile object is returned unchanged; so is output where every
/// listed score already matches.
pub fn pin_test_scores(final_output: &str, scores: &TestScores) -> String {
    let Ok(mut profile) = serde_json::from_str::<Value>(final_output) else {
        warn!("Final output is not valid JSON; test scores not pinned");
        return final_output.to_string();
    };

    let Some(competences) = profile
        .get_mut("competences")
        .and_then(Value::as_array_mut)
    else {
        warn!("Final output has no competences array; test scores not pinned");
        return final_output.to_string();
    };

    let mut corrected = 0usize;
    for competence in competences.iter_mut().filter_map(Value::as_object_mut) {
        let Some(&score) = competence_id(competence).and_then(|id| scores.get(id)) else {
            continue;
        };

        let metadata = competence
            .entry("_metadata_evaluation")
            .or_insert_with(|| json!({}));
        if !metadata.is_object() {
            *metadata = json!({});
        }
        if metadata.get("score_test") != Some(&json!(score)) {
            metadata["score_test"] = json!(score);
            corrected += 1;
        }
    }

    if corrected == 0 {
        return final_output.to_string();
    }

    warn!("Model altered {corrected} supplied test score(s); restored");
    serde_json::to_string(&profile).unwrap_or_else(|_| final_output.to_string())
}
