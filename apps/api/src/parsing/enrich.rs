//! Employee Record Enricher — copies parsed blueprint questions onto the
//! matching competences of an employee profile.

use serde_json::{Map, Value};
use tracing::warn;

use crate::parsing::blueprint::{QuestionMap, QuestionRecord};

/// Resolves a competence's id. Profiles use either `competence_id` or `id`.
pub fn competence_id(competence: &Map<String, Value>) -> Option<&str> {
    ["competence_id", "id"]
        .iter()
        .filter_map(|key| competence.get(*key).and_then(Value::as_str))
        .find(|id| !id.is_empty())
}

/// Returns `employee_json` with `question`, `question_type`, `options` and
/// `correct_answer` set on every competence that has a parsed question.
///
/// Fail-soft: anything that is not a profile object with a `competences` list of
/// objects comes back unmodified.
pub fn enrich_employee_json(employee_json: &str, questions: &QuestionMap) -> String {
    match try_enrich(employee_json, questions) {
        Ok(enriched) => enriched,
        Err(reason) => {
            warn!("Employee JSON left unenriched: {reason}");
            employee_json.to_string()
        }
    }
}

fn try_enrich(employee_json: &str, questions: &QuestionMap) -> Result<String, String> {
    let mut profile: Value =
        serde_json::from_str(employee_json).map_err(|e| format!("invalid JSON: {e}"))?;

    let profile_obj = profile
        .as_object_mut()
        .ok_or("profile is not a JSON object")?;

    if let Some(competences) = profile_obj.get_mut("competences") {
        let competences = competences
            .as_array_mut()
            .ok_or("`competences` is not an array")?;

        for competence in competences.iter_mut() {
            let competence = competence
                .as_object_mut()
                .ok_or("competence entry is not an object")?;

            let Some(record) = competence_id(competence).and_then(|id| questions.get(id)) else {
                continue;
            };
            apply_question(competence, record);
        }
    }

    serde_json::to_string(&profile).map_err(|e| e.to_string())
}

fn apply_question(competence: &mut Map<String, Value>, record: &QuestionRecord) {
    competence.insert("question".into(), Value::String(record.question.clone()));
    competence.insert(
        "question_type".into(),
        serde_json::to_value(record.question_type).unwrap_or(Value::Null),
    );
    competence.insert(
        "options".into(),
        Value::Array(record.options.iter().cloned().map(Value::String).collect()),
    );
    competence.insert(
        "correct_answer".into(),
        Value::String(record.correct_answer.clone()),
    );
}
