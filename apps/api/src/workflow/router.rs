//! Workflow Router — the pipeline as an explicit state machine.
//!
//! ```text
//! start → Analyze ─┬─ evaluate ──────────────────────────────┐
//!                  └─ otherwise → GenerateTests ─┬─ generate_tests → end
//!                                                └─ otherwise ───┤
//!                                                                 ▼
//!                                         Score → Validate → Finalize → end
//! ```

use std::fmt;

use crate::workflow::state::Mode;

/// One agent stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Skill-context analysis (plain text).
    Analyze,
    /// One MCQ per competence (blueprint text).
    GenerateTests,
    /// Scores and re-estimated levels (JSON array).
    Score,
    /// Consistency-checked levels (JSON array).
    Validate,
    /// Full employee JSON.
    Finalize,
}

impl Stage {
    /// Every run starts here, whatever the mode.
    pub const ENTRY: Stage = Stage::Analyze;

    pub fn name(self) -> &'static str {
        match self {
            Stage::Analyze => "analyze",
            Stage::GenerateTests => "generate_tests",
            Stage::Score => "score",
            Stage::Validate => "validate",
            Stage::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage to run after `completed` in `mode`. `None` ends the run.
pub fn next_stage(completed: Stage, mode: Mode) -> Option<Stage> {
    match (completed, mode) {
        (Stage::Analyze, Mode::Evaluate) => Some(Stage::Score),
        (Stage::Analyze, _) => Some(Stage::GenerateTests),
        (Stage::GenerateTests, Mode::GenerateTests) => None,
        (Stage::GenerateTests, _) => Some(Stage::Score),
        (Stage::Score, _) => Some(Stage::Validate),
        (Stage::Validate, _) => Some(Stage::Finalize),
        (Stage::Finalize, _) => None,
    }
}

/// The full stage sequence a run in `mode` walks through.
pub fn route(mode: Mode) -> Vec<Stage> {
    std::iter::successors(Some(Stage::ENTRY), |stage| next_stage(*stage, mode)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_routes_by_mode() {
        assert_eq!(
            next_stage(Stage::Analyze, Mode::Simulate),
            Some(Stage::GenerateTests)
        );
        assert_eq!(
            next_stage(Stage::Analyze, Mode::GenerateTests),
            Some(Stage::GenerateTests)
        );
        assert_eq!(next_stage(Stage::Analyze, Mode::Evaluate), Some(Stage::Score));
    }

    #[test]
    fn test_generate_tests_stops_only_in_generate_tests_mode() {
        assert_eq!(next_stage(Stage::GenerateTests, Mode::GenerateTests), None);
        assert_eq!(
            next_stage(Stage::GenerateTests, Mode::Simulate),
            Some(Stage::Score)
        );
    }

    #[test]
    fn test_tail_is_unconditional() {
        for mode in [Mode::Simulate, Mode::GenerateTests, Mode::Evaluate] {
            assert_eq!(next_stage(Stage::Score, mode), Some(Stage::Validate));
            assert_eq!(next_stage(Stage::Validate, mode), Some(Stage::Finalize));
            assert_eq!(next_stage(Stage::Finalize, mode), None);
        }
    }

    #[test]
    fn test_route_simulate_runs_all_stages() {
        assert_eq!(
            route(Mode::Simulate),
            vec![
                Stage::Analyze,
                Stage::GenerateTests,
                Stage::Score,
                Stage::Validate,
                Stage::Finalize
            ]
        );
    }

    #[test]
    fn test_route_generate_tests() {
        assert_eq!(
            route(Mode::GenerateTests),
            vec![Stage::Analyze, Stage::GenerateTests]
        );
    }

    #[test]
    fn test_route_evaluate_skips_test_generation() {
        assert_eq!(
            route(Mode::Evaluate),
            vec![Stage::Analyze, Stage::Score, Stage::Validate, Stage::Finalize]
        );
    }

    #[test]
    fn test_every_route_starts_with_analyze() {
        for mode in [Mode::Simulate, Mode::GenerateTests, Mode::Evaluate] {
            assert_eq!(route(mode)[0], Stage::ENTRY);
        }
    }
}
