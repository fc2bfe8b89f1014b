pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::auth::middleware::require_auth;
use crate::resume::handlers as resume;
use crate::resume::upload::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Request body cap for uploads: the file limit plus room for the form fields.
/// The file itself is checked against `MAX_UPLOAD_BYTES` while streaming.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let resume_routes = Router::new()
        .route(
            "/resume/upload",
            post(resume::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/resume/history", get(resume::handle_history))
        .route(
            "/resume/:id",
            get(resume::handle_get_resume).delete(resume::handle_delete_resume),
        )
        .route("/resume/:id/skills", get(resume::handle_quick_skills))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/register", post(auth::handle_register))
        .route("/login", post(auth::handle_login))
        .route("/logout", post(auth::handle_logout))
        .route("/me", get(auth::handle_me))
        .merge(resume_routes)
        .with_state(state)
}
