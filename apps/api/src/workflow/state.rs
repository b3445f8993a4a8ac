//! Workflow data model — the request, the per-run state, and the result.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflow::router::Stage;

/// Which branch of the pipeline a run takes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// All five stages; scores are simulated from the generated blueprint.
    #[default]
    Simulate,
    /// Analyze + GenerateTests only; returns the blueprint.
    GenerateTests,
    /// Analyze, then score with real results from `test_scores`.
    Evaluate,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Simulate => "simulate",
            Mode::GenerateTests => "generate_tests",
            Mode::Evaluate => "evaluate",
        })
    }
}

/// Real test scores (0–20) keyed by competence id.
pub type TestScores = BTreeMap<String, i64>;

/// Pipeline entry. Also the body of `POST /api/evaluate`.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineInput {
    pub employee_json: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub test_scores: TestScores,
}

/// Pipeline result. Fields of stages that never ran are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineOutput {
    pub analysis: String,
    pub test_blueprint: String,
    pub evaluation_results: String,
    pub validated_results: String,
    pub final_output: String,
    /// Input profile with blueprint questions attached; empty without a blueprint.
    pub enriched_employee_json: String,
}

/// The record threaded through one pipeline run.
///
/// Inputs are fixed at construction. Each stage output can only be written via
/// [`WorkflowState::record`], which touches exactly the field that stage owns.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    employee_json: String,
    mode: Mode,
    test_scores: TestScores,
    analysis: String,
    test_blueprint: String,
    evaluation_results: String,
    validated_results: String,
    final_output: String,
}

impl WorkflowState {
    pub fn new(input: PipelineInput) -> Self {
        Self {
            employee_json: input.employee_json,
            mode: input.mode,
            test_scores: input.test_scores,
            analysis: String::new(),
            test_blueprint: String::new(),
            evaluation_results: String::new(),
            validated_results: String::new(),
            final_output: String::new(),
        }
    }

    pub fn employee_json(&self) -> &str {
        &self.employee_json
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn test_scores(&self) -> &TestScores {
        &self.test_scores
    }

    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    pub fn test_blueprint(&self) -> &str {
        &self.test_blueprint
    }

    pub fn evaluation_results(&self) -> &str {
        &self.evaluation_results
    }

    pub fn validated_results(&self) -> &str {
        &self.validated_results
    }

    pub fn final_output(&self) -> &str {
        &self.final_output
    }

    /// Stores a stage's output in the field that stage owns.
    pub fn record(&mut self, stage: Stage, output: String) {
        let slot = match stage {
            Stage::Analyze => &mut self.analysis,
            Stage::GenerateTests => &mut self.test_blueprint,
            Stage::Score => &mut self.evaluation_results,
            Stage::Validate => &mut self.validated_results,
            Stage::Finalize => &mut self.final_output,
        };
        *slot = output;
    }

    pub fn into_output(self, enriched_employee_json: String) -> PipelineOutput {
        PipelineOutput {
            analysis: self.analysis,
            test_blueprint: self.test_blueprint,
            evaluation_results: self.evaluation_results,
            validated_results: self.validated_results,
            final_output: self.final_output,
            enriched_employee_json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(mode: Mode) -> PipelineInput {
        PipelineInput {
            employee_json: r#"{"employee_id":"E1"}"#.to_string(),
            mode,
            test_scores: TestScores::new(),
        }
    }

    #[test]
    fn test_mode_serde_names() {
        for (mode, name) in [
            (Mode::Simulate, "\"simulate\""),
            (Mode::GenerateTests, "\"generate_tests\""),
            (Mode::Evaluate, "\"evaluate\""),
        ] {
            assert_eq!(serde_json::to_string(&mode).unwrap(), name);
            assert_eq!(serde_json::from_str::<Mode>(name).unwrap(), mode);
            assert_eq!(format!("\"{mode}\""), name);
        }
    }

    #[test]
    fn test_input_defaults() {
        let parsed: PipelineInput = serde_json::from_str(r#"{"employee_json": "{}"}"#).unwrap();
        assert_eq!(parsed.mode, Mode::Simulate);
        assert!(parsed.test_scores.is_empty());
    }

    #[test]
    fn test_input_rejects_unknown_mode() {
        let parsed = serde_json::from_str::<PipelineInput>(
            r#"{"employee_json": "{}", "mode": "train"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_new_state_has_empty_outputs() {
        let state = WorkflowState::new(input(Mode::Evaluate));
        assert_eq!(state.mode(), Mode::Evaluate);
        assert_eq!(state.employee_json(), r#"{"employee_id":"E1"}"#);
        assert!(state.analysis().is_empty());
        assert!(state.final_output().is_empty());
    }

    #[test]
    fn test_record_writes_only_owned_field() {
        let mut state = WorkflowState::new(input(Mode::Simulate));
        state.record(Stage::GenerateTests, "blueprint".into());

        assert_eq!(state.test_blueprint(), "blueprint");
        assert!(state.analysis().is_empty());
        assert!(state.evaluation_results().is_empty());
        assert!(state.validated_results().is_empty());
        assert!(state.final_output().is_empty());

        state.record(Stage::Finalize, "{}".into());
        assert_eq!(state.final_output(), "{}");
        assert_eq!(state.test_blueprint(), "blueprint");
    }

    #[test]
    fn test_into_output_carries_every_field() {
        let mut state = WorkflowState::new(input(Mode::Simulate));
        state.record(Stage::Analyze, "a".into());
        state.record(Stage::GenerateTests, "b".into());
        state.record(Stage::Score, "c".into());
        state.record(Stage::Validate, "d".into());
        state.record(Stage::Finalize, "e".into());

        let output = state.into_output("f".into());
        assert_eq!(
            output,
            PipelineOutput {
                analysis: "a".into(),
                test_blueprint: "b".into(),
                evaluation_results: "c".into(),
                validated_results: "d".into(),
                final_output: "e".into(),
                enriched_employee_json: "f".into(),
            }
        );
    }
}
