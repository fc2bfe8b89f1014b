//! Upload pipeline: store → read back → parse → validate text → analyze → persist.
//!
//! Strictly sequential. Once the file has been written, any failure removes it
//! again before the error is returned, so storage never holds a file without
//! a resume record.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{NewResume, Resume, UserPreferences};
use crate::resume::parser::{validate_extracted_text, DocumentKind, ParsedDocument};
use crate::state::AppState;
use crate::storage::fingerprint;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const INVALID_FILE_TYPE: &str = "Invalid file type. Only PDF, DOC, and DOCX files are allowed.";
pub const FILE_TOO_LARGE: &str = "File too large. Maximum size is 5MB.";

/// A file received from the client, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub data: Bytes,
}

/// Accepts only PDF/DOC/DOCX names, case-insensitively.
pub fn check_file_type(original_name: &str) -> Result<DocumentKind, AppError> {
    DocumentKind::from_filename(original_name)
        .ok_or_else(|| AppError::Validation(INVALID_FILE_TYPE.to_string()))
}

pub fn check_file_size(len: usize) -> Result<(), AppError> {
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(FILE_TOO_LARGE.to_string()));
    }
    Ok(())
}

/// Runs the full pipeline and returns the persisted resume.
pub async fn process_upload(
    state: &AppState,
    owner: Uuid,
    file: UploadedFile,
    preferences: UserPreferences,
) -> Result<Resume, AppError> {
    let kind = check_file_type(&file.original_name)?;
    check_file_size(file.data.len())?;

    let key = fingerprint(kind.extension());
    state.store.put(&key, file.data).await?;
    info!("Stored upload '{}' as {key}", file.original_name);

    match analyze_stored(state, owner, &key, preferences).await {
        Ok(resume) => Ok(resume),
        Err(e) => {
            if let Err(cleanup) = state.store.delete(&key).await {
                warn!("Failed to remove {key} after error: {cleanup}");
            }
            Err(e)
        }
    }
}

async fn analyze_stored(
    state: &AppState,
    owner: Uuid,
    key: &str,
    preferences: UserPreferences,
) -> Result<Resume, AppError> {
    let data = state.store.get(key).await?;
    let parsed = parse_blocking(state, key, data).await?;

    let check = validate_extracted_text(&parsed.text)?;
    info!(
        "Extracted {} chars from {key} ({} pages, keywords: {})",
        parsed.text.chars().count(),
        parsed.metadata.page_count,
        check.has_resume_keywords
    );

    let analysis = state.analyzer.analyze(&parsed.text, &preferences).await?;

    state
        .resumes
        .create(NewResume {
            user_id: owner,
            filename: key.to_string(),
            extracted_text: parsed.text,
            user_preferences: preferences,
            analysis,
            metadata: parsed.metadata,
        })
        .await
}

async fn parse_blocking(
    state: &AppState,
    key: &str,
    data: Bytes,
) -> Result<ParsedDocument, AppError> {
    let parser = Arc::clone(&state.parser);
    let key = key.to_string();
    let parsed = tokio::task::spawn_blocking(move || parser.parse(&key, &data))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(parsed)
}
