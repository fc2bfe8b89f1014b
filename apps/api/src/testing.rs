//! In-memory stand-ins for every injected port, plus an `AppState` builder.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth::repository::{UserRepository, DUPLICATE_EMAIL};
use crate::auth::token::issue_token;
use crate::config::AuthConfig;
use crate::errors::AppError;
use crate::llm_client::{CompletionBackend, LlmError};
use crate::models::resume::{NewResume, Resume, ResumeMetadata, ResumeSummary};
use crate::models::user::User;
use crate::resume::analysis::ResumeAnalyzer;
use crate::resume::parser::{
    extension_of, DocumentKind, DocumentParser, ParseError, ParsedDocument,
};
use crate::resume::repository::{ResumeRepository, RESUME_NOT_FOUND};
use crate::state::AppState;
use crate::storage::{FileStore, StorageError};

/// A model reply that passes every analysis check.
pub fn valid_analysis_json() -> String {
    json!({
        "summary": "Backend engineer with five years of Rust and Postgres experience.",
        "keySkills": ["Rust", "PostgreSQL", "Kubernetes"],
        "strengths": ["Systems design", "Ownership of production services"],
        "experience": [{
            "role": "Software Engineer",
            "company": "Acme",
            "duration": "2019 - 2024",
            "keyAchievements": ["Cut p99 latency by 40%"]
        }],
        "education": [{
            "degree": "BSc Computer Science",
            "institution": "State University",
            "year": 2019,
            "specialization": "Distributed systems"
        }],
        "recommendedRoles": [{
            "role": "Backend Developer",
            "reason": "Deep server-side experience",
            "alignmentWithUserPreference": "Matches the requested role"
        }],
        "targetSectors": [{
            "sectorName": "Fintech",
            "industries": ["Payments", "Banking"],
            "reason": "Latency-sensitive backend work"
        }],
        "areasOfImprovement": {
            "resumeImprovements": [{
                "area": "Summary",
                "suggestion": "Lead with measurable impact",
                "priority": "medium"
            }],
            "skillGaps": [{
                "skill": "Terraform",
                "reason": "Common in target roles",
                "priority": "high"
            }],
            "projectSuggestions": [{
                "project": "Distributed cache",
                "description": "Build a sharded cache with consistent hashing",
                "skills": ["Rust", "Networking"]
            }]
        }
    })
    .to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Completion backend
// ────────────────────────────────────────────────────────────────────────────

/// Returns the same canned reply (or failure) to every call and records prompts.
pub struct ScriptedCompletion {
    reply: Result<String, (u16, String)>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedCompletion {
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            calls: Mutex::new(vec![]),
        })
    }

    pub fn failing(status: u16, message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err((status, message.to_string())),
            calls: Mutex::new(vec![]),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(prompt, system)` of the most recent call.
    pub fn last_call(&self) -> Option<(String, String)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedCompletion {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), system.to_string()));
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err((status, message)) => Err(LlmError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parser
// ────────────────────────────────────────────────────────────────────────────

/// Accepts any supported extension and yields a fixed text.
pub struct StubParser {
    text: String,
}

impl StubParser {
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { text: text.into() })
    }
}

impl DocumentParser for StubParser {
    fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument, ParseError> {
        let kind = DocumentKind::from_filename(filename)
            .ok_or_else(|| ParseError::UnsupportedType(extension_of(filename)))?;
        Ok(ParsedDocument {
            text: self.text.clone(),
            metadata: ResumeMetadata {
                file_size: data.len() as i64,
                file_type: kind.extension().to_string(),
                page_count: 1,
            },
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// File store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryFileStore {
    objects: Mutex<HashMap<String, Bytes>>,
    puts: Mutex<usize>,
}

impl MemoryFileStore {
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    /// Total writes ever made, including objects deleted since.
    pub fn puts(&self) -> usize {
        *self.puts.lock().unwrap()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        *self.puts.lock().unwrap() += 1;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Repositories
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryResumeRepository {
    resumes: Mutex<Vec<Resume>>,
}

impl MemoryResumeRepository {
    pub fn len(&self) -> usize {
        self.resumes.lock().unwrap().len()
    }
}

#[async_trait]
impl ResumeRepository for MemoryResumeRepository {
    async fn create(&self, resume: NewResume) -> Result<Resume, AppError> {
        let stored = Resume {
            id: Uuid::new_v4(),
            user_id: resume.user_id,
            filename: resume.filename,
            extracted_text: resume.extracted_text,
            user_preferences: resume.user_preferences,
            analysis: resume.analysis,
            metadata: resume.metadata,
            uploaded_at: Utc::now(),
        };
        self.resumes.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_for_owner(&self, owner: Uuid) -> Result<Vec<ResumeSummary>, AppError> {
        let mut owned: Vec<Resume> = self
            .resumes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|r| r.user_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(owned.into_iter().map(ResumeSummary::from).collect())
    }

    async fn get(&self, id: Uuid, owner: Uuid) -> Result<Resume, AppError> {
        self.resumes
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && r.user_id == owner)
            .cloned()
            .ok_or_else(|| AppError::NotFound(RESUME_NOT_FOUND.to_string()))
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<Resume, AppError> {
        let mut resumes = self.resumes.lock().unwrap();
        let index = resumes
            .iter()
            .position(|r| r.id == id && r.user_id == owner)
            .ok_or_else(|| AppError::NotFound(RESUME_NOT_FOUND.to_string()))?;
        Ok(resumes.remove(index))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// App state
// ────────────────────────────────────────────────────────────────────────────

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".into(),
        token_ttl_hours: 24,
        bcrypt_cost: 4,
        secure_cookies: false,
    }
}

/// A fully in-memory `AppState` with handles on each fake for assertions.
pub struct TestApp {
    pub state: AppState,
    pub users: Arc<MemoryUserRepository>,
    pub resumes: Arc<MemoryResumeRepository>,
    pub store: Arc<MemoryFileStore>,
    pub llm: Arc<ScriptedCompletion>,
}

impl TestApp {
    /// The parser yields `parsed_text` for every supported upload.
    pub fn new(llm: Arc<ScriptedCompletion>, parsed_text: &str) -> Self {
        let users = Arc::new(MemoryUserRepository::default());
        let resumes = Arc::new(MemoryResumeRepository::default());
        let store = Arc::new(MemoryFileStore::default());

        let state = AppState {
            users: users.clone(),
            resumes: resumes.clone(),
            store: store.clone(),
            parser: StubParser::new(parsed_text),
            analyzer: ResumeAnalyzer::new(llm.clone()),
            auth: auth_config(),
        };

        Self {
            state,
            users,
            resumes,
            store,
            llm,
        }
    }

    /// Creates a user directly in the repository and returns it with a valid token.
    pub async fn signed_in(&self, email: &str) -> (User, String) {
        let user = self.users.create(email, "unused-hash").await.unwrap();
        let token = issue_token(&self.state.auth, &user).unwrap();
        (user, token)
    }
}

/// Resume text long enough to pass extraction checks, with the usual section words.
pub fn resume_text() -> String {
    "Jane Doe. Email jane@example.com. Experience: five years building backend services \
     in Rust. Education: BSc Computer Science. Skills: Rust, PostgreSQL, Kubernetes."
        .to_string()
}
