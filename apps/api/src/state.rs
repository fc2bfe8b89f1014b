use std::sync::Arc;

use crate::auth::repository::UserRepository;
use crate::config::AuthConfig;
use crate::resume::analysis::ResumeAnalyzer;
use crate::resume::parser::DocumentParser;
use crate::resume::repository::ResumeRepository;
use crate::storage::FileStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every collaborator is a trait object built once in `main`, so tests can
/// swap in in-memory versions.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub resumes: Arc<dyn ResumeRepository>,
    /// Uploaded files, keyed by fingerprint.
    pub store: Arc<dyn FileStore>,
    pub parser: Arc<dyn DocumentParser>,
    pub analyzer: ResumeAnalyzer,
    pub auth: AuthConfig,
}
