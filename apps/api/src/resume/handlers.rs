//! Axum route handlers for resume upload, history, lookup, and deletion.
//! All of them sit behind `require_auth` and act on the caller's own resumes.

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    Extension, Json,
};
use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::errors::AppError;
use crate::models::resume::{
    AreasOfImprovement, RecommendedRole, Resume, ResumeMetadata, ResumeSummary, TargetSector,
    UserPreferences,
};
use crate::resume::repository::parse_resume_id;
use crate::resume::upload::{check_file_size, check_file_type, process_upload, UploadedFile};
use crate::state::AppState;

const FILE_FIELD: &str = "resume";
const NO_FILE: &str = "No file uploaded";

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

/// The part of the analysis echoed back right after an upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOverview {
    pub summary: String,
    pub key_skills: Vec<String>,
    pub strengths: Vec<String>,
    pub recommended_roles: Vec<RecommendedRole>,
    pub target_sectors: Vec<TargetSector>,
    pub areas_of_improvement: AreasOfImprovement,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub resume_id: Uuid,
    pub filename: String,
    pub analysis: AnalysisOverview,
    pub metadata: ResumeMetadata,
}

impl From<Resume> for UploadResponse {
    fn from(resume: Resume) -> Self {
        let analysis = resume.analysis;
        Self {
            message: "Resume analyzed successfully".to_string(),
            resume_id: resume.id,
            filename: resume.filename,
            analysis: AnalysisOverview {
                summary: analysis.summary,
                key_skills: analysis.key_skills,
                strengths: analysis.strengths,
                recommended_roles: analysis.recommended_roles,
                target_sectors: analysis.target_sectors,
                areas_of_improvement: analysis.areas_of_improvement,
            },
            metadata: resume.metadata,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub resumes: Vec<ResumeSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub message: String,
    pub resume_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsResponse {
    pub resume_id: Uuid,
    pub skills: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart form
// ────────────────────────────────────────────────────────────────────────────

/// Raw multipart fields before validation.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    roles_interested: Option<String>,
    sectors_interested: Option<String>,
    work_type_preference: Option<String>,
    years_of_experience: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                FILE_FIELD => form.file = Some(read_file(field).await?),
                "rolesInterested" => form.roles_interested = Some(read_text(field).await?),
                "sectorsInterested" => form.sectors_interested = Some(read_text(field).await?),
                "workTypePreference" => {
                    form.work_type_preference = Some(read_text(field).await?)
                }
                "yearsOfExperience" => form.years_of_experience = Some(read_text(field).await?),
                _ => {
                    // Unknown fields are drained so the stream can advance.
                    read_text(field).await?;
                }
            }
        }

        Ok(form)
    }

    fn preferences(&self) -> Result<UserPreferences, AppError> {
        Ok(UserPreferences {
            roles_interested: json_list("rolesInterested", &self.roles_interested)?,
            sectors_interested: json_list("sectorsInterested", &self.sectors_interested)?,
            work_type_preference: json_list("workTypePreference", &self.work_type_preference)?,
            years_of_experience: years(&self.years_of_experience)?,
        })
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
}

/// Streams the file part, rejecting the wrong type before the first chunk and
/// oversized files as soon as they cross the limit.
async fn read_file(mut field: Field<'_>) -> Result<UploadedFile, AppError> {
    let original_name = field.file_name().unwrap_or_default().to_string();
    check_file_type(&original_name)?;

    let mut data = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        check_file_size(data.len() + chunk.len())?;
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        original_name,
        data: data.freeze(),
    })
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(multipart_error)
}

fn json_list<T: DeserializeOwned>(field: &str, raw: &Option<String>) -> Result<Vec<T>, AppError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(vec![]),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| AppError::Validation(format!("Invalid {field}: {e}"))),
    }
}

/// Reads the leading whole number, so "3.5" is 3 and "7 years" is 7.
fn years(raw: &Option<String>) -> Result<u32, AppError> {
    let raw = match raw.as_deref().map(str::trim) {
        None | Some("") => return Ok(0),
        Some(raw) => raw.strip_prefix('+').unwrap_or(raw),
    };
    let digits = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    raw[..digits].parse().map_err(|_| {
        AppError::Validation("yearsOfExperience must be a non-negative integer".to_string())
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /resume/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let form = UploadForm::read(multipart).await?;
    let preferences = form.preferences()?;
    let file = form
        .file
        .filter(|f| !f.data.is_empty())
        .ok_or_else(|| AppError::Validation(NO_FILE.to_string()))?;

    info!(
        "Upload from user {}: '{}' ({} bytes)",
        user.id,
        file.original_name,
        file.data.len()
    );
    let resume = process_upload(&state, user.id, file, preferences).await?;

    Ok(Json(UploadResponse::from(resume)))
}

/// GET /resume/history
pub async fn handle_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HistoryResponse>, AppError> {
    let resumes = state.resumes.list_for_owner(user.id).await?;
    Ok(Json(HistoryResponse {
        count: resumes.len(),
        resumes,
    }))
}

/// GET /resume/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Resume>, AppError> {
    let id = parse_resume_id(&id)?;
    Ok(Json(state.resumes.get(id, user.id).await?))
}

/// GET /resume/:id/skills
///
/// Flat skill list from a fresh model call over the stored text. Empty when
/// the model call fails.
pub async fn handle_quick_skills(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<SkillsResponse>, AppError> {
    let id = parse_resume_id(&id)?;
    let resume = state.resumes.get(id, user.id).await?;
    let skills = state.analyzer.quick_skills(&resume.extracted_text).await;
    Ok(Json(SkillsResponse {
        resume_id: resume.id,
        skills,
    }))
}

/// DELETE /resume/:id
///
/// Removes the record, then the stored file. A missing file is only logged.
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = parse_resume_id(&id)?;
    let resume = state.resumes.delete(id, user.id).await?;

    if let Err(e) = state.store.delete(&resume.filename).await {
        warn!("Could not delete file {}: {e}", resume.filename);
    }

    Ok(Json(DeleteResponse {
        message: "Resume deleted successfully".to_string(),
        resume_id: resume.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::WorkType;

    #[test]
    fn test_preferences_from_form_fields() {
        let form = UploadForm {
            roles_interested: Some(r#"["Backend Developer"]"#.into()),
            work_type_preference: Some(r#"["Remote", "Internship"]"#.into()),
            years_of_experience: Some(" 3 ".into()),
            ..Default::default()
        };
        let prefs = form.preferences().unwrap();
        assert_eq!(prefs.roles_interested, vec!["Backend Developer"]);
        assert!(prefs.sectors_interested.is_empty());
        assert_eq!(
            prefs.work_type_preference,
            vec![WorkType::Remote, WorkType::Internship]
        );
        assert_eq!(prefs.years_of_experience, 3);
    }

    #[test]
    fn test_empty_form_gives_default_preferences() {
        let form = UploadForm {
            years_of_experience: Some(String::new()),
            ..Default::default()
        };
        assert!(form.preferences().unwrap().is_empty());
    }

    #[test]
    fn test_bad_preference_json_rejected() {
        let form = UploadForm {
            sectors_interested: Some("Fintech".into()),
            ..Default::default()
        };
        assert!(matches!(
            form.preferences(),
            Err(AppError::Validation(ref m)) if m.contains("sectorsInterested")
        ));

        let form = UploadForm {
            work_type_preference: Some(r#"["Moonlighting"]"#.into()),
            ..Default::default()
        };
        assert!(form.preferences().is_err());

        let form = UploadForm {
            years_of_experience: Some("-1".into()),
            ..Default::default()
        };
        assert!(form.preferences().is_err());
    }

    #[test]
    fn test_years_reads_leading_integer() {
        for (raw, expected) in [("3.5", 3), ("7 years", 7), ("+2", 2), (" 10 ", 10)] {
            assert_eq!(years(&Some(raw.to_string())).unwrap(), expected, "{raw}");
        }
        assert_eq!(years(&None).unwrap(), 0);

        for raw in ["abc", "-1", ".5", "99999999999"] {
            assert!(
                matches!(years(&Some(raw.to_string())), Err(AppError::Validation(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_upload_response_carries_overview() {
        let analysis: crate::models::resume::Analysis =
            serde_json::from_str(&crate::testing::valid_analysis_json()).unwrap();
        let resume = Resume {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            filename: "resume-1-2.pdf".into(),
            extracted_text: "text".into(),
            user_preferences: UserPreferences::default(),
            analysis,
            metadata: ResumeMetadata {
                file_size: 10,
                file_type: ".pdf".into(),
                page_count: 1,
            },
            uploaded_at: chrono::Utc::now(),
        };
        let body = serde_json::to_value(UploadResponse::from(resume)).unwrap();
        assert_eq!(body["message"], "Resume analyzed successfully");
        assert_eq!(body["filename"], "resume-1-2.pdf");
        assert_eq!(body["analysis"]["keySkills"][0], "Rust");
        assert!(body["analysis"].get("experience").is_none());
        assert_eq!(body["metadata"]["fileType"], ".pdf");
    }
}
