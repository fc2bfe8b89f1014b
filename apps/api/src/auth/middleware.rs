use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::token::{extract_token, verify_token, AUTH_REQUIRED};
use crate::errors::AppError;
use crate::state::AppState;

/// The authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Rejects requests without a valid session token with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers()).ok_or_else(|| {
        tracing::warn!("token missing, authentication denied");
        AppError::Unauthorized(AUTH_REQUIRED.to_string())
    })?;

    let claims = verify_token(&state.auth, &token)?;
    request.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(request).await)
}
