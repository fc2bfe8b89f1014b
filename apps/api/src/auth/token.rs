//! Session tokens: HS256 JWTs carried in the `jwt` cookie or a Bearer header.

use axum::http::{header, HeaderMap};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::errors::AppError;
use crate::models::user::User;

pub const SESSION_COOKIE: &str = "jwt";

pub const AUTH_REQUIRED: &str = "Authentication required";
pub const INVALID_TOKEN: &str = "Invalid or expired token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(config: &AuthConfig, user: &User) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign token: {e}")))
}

/// Checks signature and expiry.
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("Token rejected: {e}");
        AppError::Unauthorized(INVALID_TOKEN.to_string())
    })
}

/// The session cookie wins over the Authorization header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE).filter(|c| !c.value().is_empty()) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
}

/// `Set-Cookie` value for a freshly issued token.
pub fn session_cookie(config: &AuthConfig, token: &str) -> String {
    let max_age = config.token_ttl_hours * 3600;
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Strict; Max-Age={max_age}");
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session cookie immediately.
pub fn clear_session_cookie(config: &AuthConfig) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Strict; Max-Age=0");
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 24,
            bcrypt_cost: 4,
            secure_cookies: false,
        }
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "jane@example.com".into(),
            password_hash: "unused".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let user = user();
        let token = issue_token(&config(), &user).unwrap();
        let claims = verify_token(&config(), &token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issue_token(&config(), &user()).unwrap();
        let other = AuthConfig {
            jwt_secret: "another-secret".into(),
            ..config()
        };
        let err = verify_token(&other, &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == INVALID_TOKEN));
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = AuthConfig {
            token_ttl_hours: -2,
            ..config()
        };
        let token = issue_token(&expired, &user()).unwrap();
        assert!(verify_token(&config(), &token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_token(&config(), "not.a.jwt").is_err());
    }

    #[test]
    fn test_extract_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; jwt=abc.def.ghi"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_preferred_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("jwt=from-cookie"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_extract_none() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&headers).is_none());
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        headers.insert(header::COOKIE, HeaderValue::from_static("jwt="));
        assert!(extract_token(&headers).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(&config(), "tok");
        assert_eq!(
            cookie,
            "jwt=tok; HttpOnly; Path=/; SameSite=Strict; Max-Age=86400"
        );
        let secure = AuthConfig {
            secure_cookies: true,
            ..config()
        };
        assert!(session_cookie(&secure, "tok").ends_with("; Secure"));
        assert!(clear_session_cookie(&config()).contains("Max-Age=0"));
    }
}
