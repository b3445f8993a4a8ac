//! Course recommendation — a search-grounded model call, run outside the
//! evaluation pipeline, that proposes training for the largest skill gaps.
//!
//! Flow: evaluated profile → gap prompt → grounded model call →
//!       array extraction → per-course parsing → URL back-fill.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::llm_client::LanguageModel;
use crate::parsing::enrich::competence_id;
use crate::parsing::fences::extract_json_array;
use crate::workflow::prompts::render;

pub mod backfill;
pub mod handlers;
pub mod lenient;
pub mod prompts;

use backfill::backfill_urls;
use prompts::{RECOMMEND_FALLBACK_TEMPLATE, RECOMMEND_PROMPT_TEMPLATE, RECOMMEND_SYSTEM};

/// Gaps beyond this many are left out of the prompt.
const MAX_PROMPT_GAPS: usize = 6;
/// Characters of raw profile sent when the profile is not valid JSON.
const FALLBACK_EXCERPT_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Prioritaire,
    Important,
    #[default]
    #[serde(other)]
    Utile,
}

/// One recommended course, as returned to the dashboard.
///
/// Every field tolerates loose model output (see [`lenient`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecommendation {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub platform: String,
    /// `None` when the model left it out; may be back-filled from grounding sources.
    #[serde(
        default,
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::priority")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub competences_cibles: Vec<String>,
    /// 1–10, absent when the model gave nothing usable.
    #[serde(
        default,
        deserialize_with = "lenient::importance",
        skip_serializing_if = "Option::is_none"
    )]
    pub importance: Option<u8>,
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Recommends courses for an evaluated employee profile.
///
/// Never fails: a failed model call or an unusable answer yields an empty list.
pub async fn recommend_courses(
    llm: &dyn LanguageModel,
    final_output_json: &str,
) -> Vec<CourseRecommendation> {
    let prompt = build_prompt(final_output_json);

    let grounded = match llm.complete_with_search(RECOMMEND_SYSTEM, &prompt).await {
        Ok(grounded) => grounded,
        Err(e) => {
            warn!("Course recommendation call failed: {e}");
            return Vec::new();
        }
    };

    let mut courses = parse_courses(&grounded.text);
    let filled = backfill_urls(&mut courses, &grounded.sources);

    info!(
        "Recommended {} courses ({} sources, {} URLs back-filled)",
        courses.len(),
        grounded.sources.len(),
        filled
    );
    courses
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt building
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct SkillGap {
    competence_id: String,
    titre: String,
    current: f64,
    target: f64,
}

impl SkillGap {
    fn size(&self) -> f64 {
        self.target - self.current
    }
}

fn level(competence: &serde_json::Map<String, Value>, key: &str) -> f64 {
    competence.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// Competences below their 12-month target, largest gap first.
fn skill_gaps(profile: &Value) -> Vec<SkillGap> {
    let mut gaps: Vec<SkillGap> = profile
        .get("competences")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|c| SkillGap {
            competence_id: competence_id(c).unwrap_or("").to_string(),
            titre: c
                .get("titre")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            current: level(c, "niveau_estime"),
            target: level(c, "niveau_attendu_12m"),
        })
        .filter(|gap| gap.current < gap.target)
        .collect();

    gaps.sort_by(|a, b| b.size().partial_cmp(&a.size()).unwrap_or(Ordering::Equal));
    gaps
}

fn build_prompt(final_output_json: &str) -> String {
    let profile = match serde_json::from_str::<Value>(final_output_json) {
        Ok(profile) if profile.is_object() => profile,
        _ => {
            let excerpt: String = final_output_json
                .chars()
                .take(FALLBACK_EXCERPT_CHARS)
                .collect();
            return render(
                RECOMMEND_FALLBACK_TEMPLATE,
                &[("profile_excerpt", excerpt.as_str())],
            );
        }
    };

    let text_field = |key: &str, default: &str| {
        profile
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };

    let gaps = skill_gaps(&profile)
        .iter()
        .take(MAX_PROMPT_GAPS)
        .map(|g| {
            format!(
                "- {} (ID: {}) — niveau actuel {}/5, cible {}/5, gap={}",
                g.titre,
                g.competence_id,
                g.current,
                g.target,
                g.size()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let employee_name = text_field("employee_name", "employé");
    let poste = text_field("poste", "développeur");
    render(
        RECOMMEND_PROMPT_TEMPLATE,
        &[
            ("employee_name", employee_name.as_str()),
            ("poste", poste.as_str()),
            ("gaps", gaps.as_str()),
        ],
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Output parsing
// ────────────────────────────────────────────────────────────────────────────

/// Extracts courses from raw model text. Only elements that aren't JSON objects
/// are dropped; anything that isn't an array yields nothing.
fn parse_courses(raw: &str) -> Vec<CourseRecommendation> {
    let items = match serde_json::from_str::<Value>(extract_json_array(raw)) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("Course recommendation output is not a JSON array");
            return Vec::new();
        }
        Err(e) => {
            warn!("Course recommendation output is not valid JSON: {e}");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter(|item| {
            let keep = item.is_object();
            if !keep {
                warn!("Dropping non-object course recommendation: {item}");
            }
            keep
        })
        .filter_map(|item| match serde_json::from_value::<CourseRecommendation>(item) {
            Ok(course) => Some(course),
            Err(e) => {
                warn!("Dropping unreadable course recommendation: {e}");
                None
            }
        })
        .collect()
}
