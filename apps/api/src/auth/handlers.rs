//! Axum route handlers for registration and sessions.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repository::DUPLICATE_EMAIL;
use crate::auth::token::{
    clear_session_cookie, extract_token, issue_token, session_cookie, verify_token,
};
use crate::errors::AppError;
use crate::models::user::UserProfile;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid login credentials";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: Option<String>,
    #[validate(
        must_match(other = "confirm_password", message = "Passwords do not match"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl RegisterRequest {
    /// Blank fields become missing; the email takes its stored form.
    fn normalized(self) -> Self {
        Self {
            email: non_empty(self.email).map(|e| normalize_email(&e)),
            password: non_empty(self.password),
            confirm_password: non_empty(self.confirm_password),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// Emails are stored trimmed and lowercased.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn cookie_header(value: String) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid cookie header: {e}")))?,
    );
    Ok(headers)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let req = req.normalized();
    let (Some(email), Some(password), Some(_)) =
        (&req.email, &req.password, &req.confirm_password)
    else {
        return Err(AppError::Validation(
            "Please provide email and password".to_string(),
        ));
    };
    req.validate()?;

    if state.users.find_by_email(email).await?.is_some() {
        return Err(AppError::Validation(DUPLICATE_EMAIL.to_string()));
    }

    let password_hash = hash_password(password.clone(), state.auth.bcrypt_cost).await?;
    let user = state.users.create(email, &password_hash).await?;
    let token = issue_token(&state.auth, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token,
            user: UserProfile::from(&user),
        }),
    ))
}

/// POST /login
///
/// Sets the httpOnly session cookie and also returns the token for Bearer use.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), AppError> {
    let (Some(email), Some(password)) = (non_empty(req.email), non_empty(req.password)) else {
        return Err(AppError::Validation(
            "Please provide email and password".to_string(),
        ));
    };

    let user = state
        .users
        .find_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(password, user.password_hash.clone()).await? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = issue_token(&state.auth, &user)?;
    let headers = cookie_header(session_cookie(&state.auth, &token))?;
    info!("User {} logged in", user.id);

    Ok((
        headers,
        Json(AuthResponse {
            message: "Login successful".to_string(),
            token,
            user: UserProfile::from(&user),
        }),
    ))
}

/// POST /logout
pub async fn handle_logout(
    State(state): State<AppState>,
) -> Result<(HeaderMap, Json<MessageResponse>), AppError> {
    let headers = cookie_header(clear_session_cookie(&state.auth))?;
    Ok((
        headers,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// GET /me
///
/// Never errors: anything short of a valid token for an existing user is
/// reported as `{"isAuthenticated": false}` with 401.
pub async fn handle_me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let unauthenticated = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(MeResponse {
                is_authenticated: false,
                user: None,
            }),
        )
            .into_response()
    };

    let Some(claims) = extract_token(&headers).and_then(|t| verify_token(&state.auth, &t).ok())
    else {
        return unauthenticated();
    };

    match state.users.find_by_id(claims.sub).await {
        Ok(Some(user)) => Json(MeResponse {
            is_authenticated: true,
            user: Some(UserProfile::from(&user)),
        })
        .into_response(),
        _ => unauthenticated(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }

    fn register(email: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.into()),
            password: Some(password.into()),
            confirm_password: Some(confirm.into()),
        }
        .normalized()
    }

    fn rejection(req: RegisterRequest) -> String {
        match req.validate().map_err(AppError::from) {
            Err(AppError::Validation(message)) => message,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_register_request_validation() {
        assert!(register(" Jane@Example.COM ", "secret1", "secret1")
            .validate()
            .is_ok());

        for email in ["jane.example.com", "@example.com", "jane doe@example.com"] {
            assert_eq!(
                rejection(register(email, "secret1", "secret1")),
                "Please provide a valid email address"
            );
        }
        assert_eq!(
            rejection(register("a@b.io", "secret1", "secret2")),
            "Passwords do not match"
        );
        assert_eq!(
            rejection(register("a@b.io", "abc", "abc")),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_blank_register_fields_count_as_missing() {
        let req = register("  ", "secret1", " ");
        assert!(req.email.is_none());
        assert!(req.confirm_password.is_none());
        assert_eq!(req.password.as_deref(), Some("secret1"));
    }

    #[test]
    fn test_register_request_reads_camel_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email": "a@b.io", "password": "secret1", "confirmPassword": "secret1"}"#,
        )
        .unwrap();
        assert_eq!(req.confirm_password.as_deref(), Some("secret1"));
    }
}
