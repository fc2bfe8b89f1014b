use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Preferences
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkType {
    Remote,
    Offline,
    Hybrid,
    Job,
    Internship,
    Freelance,
}

impl WorkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkType::Remote => "Remote",
            WorkType::Offline => "Offline",
            WorkType::Hybrid => "Hybrid",
            WorkType::Job => "Job",
            WorkType::Internship => "Internship",
            WorkType::Freelance => "Freelance",
        }
    }
}

/// Career interests supplied with an upload. They steer the analysis prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub roles_interested: Vec<String>,
    pub sectors_interested: Vec<String>,
    pub work_type_preference: Vec<WorkType>,
    pub years_of_experience: u32,
}

impl UserPreferences {
    pub fn is_empty(&self) -> bool {
        self == &UserPreferences::default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceItem {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key_achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationItem {
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    // Models emit graduation years as either "2020" or 2020.
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedRole {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub alignment_with_user_preference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSector {
    #[serde(default)]
    pub sector_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub industries: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeImprovement {
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSuggestion {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreasOfImprovement {
    pub resume_improvements: Vec<ResumeImprovement>,
    pub skill_gaps: Vec<SkillGap>,
    pub project_suggestions: Vec<ProjectSuggestion>,
}

/// Structured career assessment produced by the model.
/// Only ever constructed through `resume::analysis::validate_analysis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub summary: String,
    pub key_skills: Vec<String>,
    pub strengths: Vec<String>,
    pub experience: Vec<ExperienceItem>,
    pub education: Vec<EducationItem>,
    pub recommended_roles: Vec<RecommendedRole>,
    pub target_sectors: Vec<TargetSector>,
    pub areas_of_improvement: AreasOfImprovement,
}

/// Nested lists in model output may come back as `null`; treat that as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resume records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeMetadata {
    pub file_size: i64,
    /// Lowercased extension including the dot, e.g. ".pdf".
    pub file_type: String,
    pub page_count: i32,
}

/// Everything needed to persist a freshly analyzed upload.
#[derive(Debug, Clone)]
pub struct NewResume {
    pub user_id: Uuid,
    pub filename: String,
    pub extracted_text: String,
    pub user_preferences: UserPreferences,
    pub analysis: Analysis,
    pub metadata: ResumeMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Storage key of the uploaded file.
    pub filename: String,
    pub extracted_text: String,
    pub user_preferences: UserPreferences,
    pub analysis: Analysis,
    pub metadata: ResumeMetadata,
    pub uploaded_at: DateTime<Utc>,
}

/// History listing entry. Same as `Resume` without the extracted text.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub user_preferences: UserPreferences,
    pub analysis: Analysis,
    pub metadata: ResumeMetadata,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Resume> for ResumeSummary {
    fn from(resume: Resume) -> Self {
        Self {
            id: resume.id,
            user_id: resume.user_id,
            filename: resume.filename,
            user_preferences: resume.user_preferences,
            analysis: resume.analysis,
            metadata: resume.metadata,
            uploaded_at: resume.uploaded_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub extracted_text: String,
    pub user_preferences: Json<UserPreferences>,
    pub analysis: Json<Analysis>,
    pub file_size: i64,
    pub file_type: String,
    pub page_count: i32,
    pub uploaded_at: DateTime<Utc>,
}

impl From<ResumeRow> for Resume {
    fn from(row: ResumeRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            filename: row.filename,
            extracted_text: row.extracted_text,
            user_preferences: row.user_preferences.0,
            analysis: row.analysis.0,
            metadata: ResumeMetadata {
                file_size: row.file_size,
                file_type: row.file_type,
                page_count: row.page_count,
            },
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ResumeSummaryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub user_preferences: Json<UserPreferences>,
    pub analysis: Json<Analysis>,
    pub file_size: i64,
    pub file_type: String,
    pub page_count: i32,
    pub uploaded_at: DateTime<Utc>,
}

impl From<ResumeSummaryRow> for ResumeSummary {
    fn from(row: ResumeSummaryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            filename: row.filename,
            user_preferences: row.user_preferences.0,
            analysis: row.analysis.0,
            metadata: ResumeMetadata {
                file_size: row.file_size,
                file_type: row.file_type,
                page_count: row.page_count,
            },
            uploaded_at: row.uploaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_accept_partial_json() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"rolesInterested": ["Backend Developer"]}"#).unwrap();
        assert_eq!(prefs.roles_interested, vec!["Backend Developer"]);
        assert!(prefs.work_type_preference.is_empty());
        assert_eq!(prefs.years_of_experience, 0);
        assert!(!prefs.is_empty());
    }

    #[test]
    fn test_unknown_work_type_rejected() {
        let result: Result<Vec<WorkType>, _> = serde_json::from_str(r#"["Remote", "Onsite"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_priority_accepts_capitalized() {
        let p: Priority = serde_json::from_str(r#""High""#).unwrap();
        assert_eq!(p, Priority::High);
        assert_eq!(serde_json::to_string(&p).unwrap(), r#""high""#);
    }

    #[test]
    fn test_education_year_accepts_number() {
        let item: EducationItem =
            serde_json::from_str(r#"{"degree": "BSc", "institution": "MIT", "year": 2020}"#)
                .unwrap();
        assert_eq!(item.year.as_deref(), Some("2020"));
        assert!(item.specialization.is_none());
    }

    #[test]
    fn test_education_year_rejects_object() {
        let result: Result<EducationItem, _> =
            serde_json::from_str(r#"{"degree": "BSc", "year": {"from": 2016}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let metadata = ResumeMetadata {
            file_size: 2048,
            file_type: ".pdf".into(),
            page_count: 2,
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["fileType"], ".pdf");
        assert_eq!(json["fileSize"], 2048);
        assert_eq!(json["pageCount"], 2);
    }
}
