//! Analysis Client: prompts the model with resume text and preferences and
//! validates the reply into a typed `Analysis`.
//!
//! The reply is never trusted: `validate_analysis` returns a tagged
//! `AnalysisValidation`, and anything but `Valid` fails the upload. There is
//! no partial acceptance and no retry.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::{JSON_ONLY_SUFFIX, JSON_ONLY_SYSTEM};
use crate::llm_client::{strip_json_fences, CompletionBackend};
use crate::models::resume::{Analysis, UserPreferences};
use crate::resume::prompts::{ANALYSIS_SYSTEM, PREFERENCES_CLOSING, QUICK_SKILLS_PROMPT};

/// Top-level fields every analysis must carry.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "summary",
    "keySkills",
    "strengths",
    "experience",
    "education",
    "recommendedRoles",
    "targetSectors",
    "areasOfImprovement",
];

const ARRAY_FIELDS: [&str; 6] = [
    "keySkills",
    "strengths",
    "experience",
    "education",
    "recommendedRoles",
    "targetSectors",
];

const IMPROVEMENT_LISTS: [&str; 3] = ["resumeImprovements", "skillGaps", "projectSuggestions"];

/// Characters of resume text sent for quick skill extraction.
const QUICK_SKILLS_CHARS: usize = 3000;

/// Result of checking a raw model reply against the analysis schema.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisValidation {
    Valid(Analysis),
    Invalid(AnalysisIssues),
}

/// Everything wrong with a rejected reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisIssues {
    /// Absent required fields, e.g. `keySkills` or `areasOfImprovement.skillGaps`.
    pub missing: Vec<String>,
    /// Present but wrongly shaped fields, or a reply that is not JSON at all.
    pub malformed: Vec<String>,
}

impl AnalysisIssues {
    fn malformed(reason: String) -> Self {
        Self {
            missing: vec![],
            malformed: vec![reason],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.malformed.is_empty()
    }
}

impl fmt::Display for AnalysisIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing {}", self.missing.join(", ")));
        }
        parts.extend(self.malformed.iter().cloned());
        write!(f, "Invalid analysis response: {}", parts.join("; "))
    }
}

/// Validates a raw model reply. Code fences are stripped first.
pub fn validate_analysis(raw: &str) -> AnalysisValidation {
    let value: Value = match serde_json::from_str(strip_json_fences(raw)) {
        Ok(v) => v,
        Err(e) => {
            return AnalysisValidation::Invalid(AnalysisIssues::malformed(format!(
                "response is not valid JSON: {e}"
            )))
        }
    };

    let Some(obj) = value.as_object() else {
        return AnalysisValidation::Invalid(AnalysisIssues::malformed(
            "response must be a JSON object".to_string(),
        ));
    };

    let mut issues = AnalysisIssues::default();

    for field in REQUIRED_FIELDS {
        if !obj.contains_key(field) {
            issues.missing.push(field.to_string());
        }
    }

    match obj.get("summary") {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(_) => issues
            .malformed
            .push("summary must be a non-empty string".to_string()),
        None => {}
    }

    for field in ARRAY_FIELDS {
        if obj.get(field).is_some_and(|v| !v.is_array()) {
            issues.malformed.push(format!("{field} must be an array"));
        }
    }

    match obj.get("areasOfImprovement") {
        Some(Value::Object(areas)) => {
            for list in IMPROVEMENT_LISTS {
                match areas.get(list) {
                    Some(Value::Array(_)) => {}
                    Some(_) => issues
                        .malformed
                        .push(format!("areasOfImprovement.{list} must be an array")),
                    None => issues.missing.push(format!("areasOfImprovement.{list}")),
                }
            }
        }
        Some(_) => issues
            .malformed
            .push("areasOfImprovement must be an object".to_string()),
        None => {}
    }

    if !issues.is_empty() {
        return AnalysisValidation::Invalid(issues);
    }

    match serde_json::from_value::<Analysis>(value) {
        Ok(analysis) => AnalysisValidation::Valid(analysis),
        Err(e) => AnalysisValidation::Invalid(AnalysisIssues::malformed(format!(
            "response does not match the analysis schema: {e}"
        ))),
    }
}

/// Builds the user prompt: resume text, then the preference block (omitted
/// when every preference is default), then the JSON-only instruction.
pub fn build_analysis_prompt(resume_text: &str, preferences: &UserPreferences) -> String {
    let mut prompt = format!("RESUME CONTENT:\n{resume_text}");

    if !preferences.is_empty() {
        prompt.push_str("\n\nUSER PREFERENCES:\n");
        if !preferences.roles_interested.is_empty() {
            prompt.push_str(&format!(
                "- Interested in roles: {}\n",
                preferences.roles_interested.join(", ")
            ));
        }
        if !preferences.sectors_interested.is_empty() {
            prompt.push_str(&format!(
                "- Interested in sectors: {}\n",
                preferences.sectors_interested.join(", ")
            ));
        }
        if !preferences.work_type_preference.is_empty() {
            let work_types: Vec<&str> = preferences
                .work_type_preference
                .iter()
                .map(|w| w.as_str())
                .collect();
            prompt.push_str(&format!(
                "- Work type preference: {}\n",
                work_types.join(", ")
            ));
        }
        if preferences.years_of_experience > 0 {
            prompt.push_str(&format!(
                "- Years of experience: {}\n",
                preferences.years_of_experience
            ));
        }
        prompt.push('\n');
        prompt.push_str(PREFERENCES_CLOSING);
    }

    prompt.push_str("\n\n");
    prompt.push_str(JSON_ONLY_SUFFIX);
    prompt
}

/// Career analysis over an injected completion backend.
#[derive(Clone)]
pub struct ResumeAnalyzer {
    backend: Arc<dyn CompletionBackend>,
}

impl ResumeAnalyzer {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Sends the resume to the model and returns the validated analysis.
    pub async fn analyze(
        &self,
        resume_text: &str,
        preferences: &UserPreferences,
    ) -> Result<Analysis, AppError> {
        let prompt = build_analysis_prompt(resume_text, preferences);
        let raw = self.backend.complete(&prompt, ANALYSIS_SYSTEM).await?;

        match validate_analysis(&raw) {
            AnalysisValidation::Valid(analysis) => {
                info!(
                    "Analysis accepted: {} skills, {} recommended roles",
                    analysis.key_skills.len(),
                    analysis.recommended_roles.len()
                );
                Ok(analysis)
            }
            AnalysisValidation::Invalid(issues) => {
                warn!("Rejected model reply: {issues}");
                Err(AppError::Analysis(issues.to_string()))
            }
        }
    }

    /// Flat skill list from the start of the resume. Never fails: any error
    /// yields an empty list.
    pub async fn quick_skills(&self, resume_text: &str) -> Vec<String> {
        let head: String = resume_text.chars().take(QUICK_SKILLS_CHARS).collect();
        let prompt = QUICK_SKILLS_PROMPT.replace("{resume_text}", &head);

        let raw = match self.backend.complete(&prompt, JSON_ONLY_SYSTEM).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Quick skills extraction failed: {e}");
                return vec![];
            }
        };

        match serde_json::from_str::<Value>(strip_json_fences(&raw)) {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s),
                    _ => None,
                })
                .collect(),
            Ok(_) => vec![],
            Err(e) => {
                warn!("Quick skills reply was not JSON: {e}");
                vec![]
            }
        }
    }
}
