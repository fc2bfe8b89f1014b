use anyhow::{bail, Context, Result};

pub const DEFAULT_LLM_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_LLM_MODEL: &str = "claude-sonnet-4-5";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Unset means permissive CORS.
    pub cors_origin: Option<String>,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// Adds `Secure` to the session cookie.
    pub secure_cookies: bool,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    Local {
        upload_dir: String,
    },
    S3 {
        bucket: String,
        endpoint: String,
        access_key_id: String,
        secret_access_key: String,
    },
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let storage = match or_default("STORAGE_BACKEND", "local").as_str() {
            "local" => StorageConfig::Local {
                upload_dir: or_default("UPLOAD_DIR", "uploads"),
            },
            "s3" => StorageConfig::S3 {
                bucket: require("S3_BUCKET")?,
                endpoint: require("S3_ENDPOINT")?,
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            },
            other => bail!("STORAGE_BACKEND must be 'local' or 's3', got '{other}'"),
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            port: or_default("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
            cors_origin: lookup("CORS_ORIGIN").filter(|v| !v.is_empty()),
            auth: AuthConfig {
                jwt_secret: require("JWT_SECRET")?,
                token_ttl_hours: or_default("JWT_TTL_HOURS", "24")
                    .parse()
                    .context("JWT_TTL_HOURS must be an integer")?,
                bcrypt_cost: or_default("BCRYPT_COST", "12")
                    .parse()
                    .context("BCRYPT_COST must be an integer")?,
                secure_cookies: or_default("APP_ENV", "development") == "production",
            },
            llm: LlmConfig {
                api_key: require("LLM_API_KEY")?,
                api_url: or_default("LLM_API_URL", DEFAULT_LLM_API_URL),
                model: or_default("LLM_MODEL", DEFAULT_LLM_MODEL),
                max_tokens: or_default("LLM_MAX_TOKENS", "4096")
                    .parse()
                    .context("LLM_MAX_TOKENS must be an integer")?,
            },
            storage,
        })
    }
}
