//! Owner-scoped resume persistence. Every read and delete is scoped by owner:
//! a resume that belongs to someone else is reported exactly like a missing one.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{NewResume, Resume, ResumeRow, ResumeSummary, ResumeSummaryRow};

pub const RESUME_NOT_FOUND: &str = "Resume not found";

#[async_trait]
pub trait ResumeRepository: Send + Sync {
    async fn create(&self, resume: NewResume) -> Result<Resume, AppError>;

    /// Newest first, without the extracted text.
    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<ResumeSummary>, AppError>;

    async fn get(&self, id: Uuid, owner: Uuid) -> Result<Resume, AppError>;

    /// Removes the record and returns it so the caller can drop the stored file.
    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<Resume, AppError>;
}

/// Path ids that are not UUIDs cannot name any resume.
pub fn parse_resume_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(RESUME_NOT_FOUND.to_string()))
}

pub struct PgResumeRepository {
    pool: PgPool,
}

impl PgResumeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeRepository for PgResumeRepository {
    async fn create(&self, resume: NewResume) -> Result<Resume, AppError> {
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes
                (id, user_id, filename, extracted_text, user_preferences, analysis,
                 file_size, file_type, page_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(resume.user_id)
        .bind(&resume.filename)
        .bind(&resume.extracted_text)
        .bind(Json(&resume.user_preferences))
        .bind(Json(&resume.analysis))
        .bind(resume.metadata.file_size)
        .bind(&resume.metadata.file_type)
        .bind(resume.metadata.page_count)
        .fetch_one(&self.pool)
        .await?;

        info!("Saved resume {} for user {}", row.id, row.user_id);
        Ok(row.into())
    }

    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<ResumeSummary>, AppError> {
        let rows = sqlx::query_as::<_, ResumeSummaryRow>(
            r#"
            SELECT id, user_id, filename, user_preferences, analysis,
                   file_size, file_type, page_count, uploaded_at
            FROM resumes
            WHERE user_id = $1
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ResumeSummary::from).collect())
    }

    async fn get(&self, id: Uuid, owner: Uuid) -> Result<Resume, AppError> {
        sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?
            .map(Resume::from)
            .ok_or_else(|| AppError::NotFound(RESUME_NOT_FOUND.to_string()))
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<Resume, AppError> {
        let deleted = sqlx::query_as::<_, ResumeRow>(
            "DELETE FROM resumes WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .map(Resume::from)
        .ok_or_else(|| AppError::NotFound(RESUME_NOT_FOUND.to_string()))?;

        info!("Deleted resume {id} for user {owner}");
        Ok(deleted)
    }
}
