//! Environment-backed settings for the sandbox services.
//!
//! Every setting is `environment value OR hardcoded fallback`. A missing
//! variable falls back; a present but malformed one is an error at load time.

use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::http::Headers;

pub const DEFAULT_API_BASE_URL: &str = "https://reqres.in";
pub const DEFAULT_JSONPLACEHOLDER_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_INVENTORY_BASE_URL: &str = "https://fakestoreapi.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USERNAME: &str = "eve.holt@reqres.in";
pub const DEFAULT_PASSWORD: &str = "cityslicka";
pub const DEFAULT_TOKEN: &str = "QpwL5tke4Pnpja7X4";
pub const DEFAULT_REPORT_PATH: &str = "reports/report.html";

pub const LOGIN_PATH: &str = "/api/login";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
pub const CONTENT_TYPE_JSON: &str = "application/json;charset=UTF-8";

static GLOBAL: OnceCell<Config> = OnceCell::new();

/// Login payload. Serializes as `{"email": ..., "password": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// User-management sandbox (`API_BASE_URL`).
    pub api_base_url: String,
    /// Placeholder JSON API (`JSONPLACEHOLDER_BASE_URL`).
    pub jsonplaceholder_base_url: String,
    /// Inventory API (`INVENTORY_BASE_URL`).
    pub inventory_base_url: String,
    pub timeout: Duration,
    pub ssl_verify: bool,
    pub default_headers: Headers,
    pub credentials: Credentials,
    /// Pre-issued token for suites that skip the login call.
    pub fixed_token: String,
    /// Substitute token handed out when the login endpoint is blocked.
    pub mock_token: String,
    pub report_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            jsonplaceholder_base_url: DEFAULT_JSONPLACEHOLDER_BASE_URL.to_string(),
            inventory_base_url: DEFAULT_INVENTORY_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ssl_verify: false,
            default_headers: default_headers(),
            credentials: Credentials::new(DEFAULT_USERNAME, DEFAULT_PASSWORD),
            fixed_token: DEFAULT_TOKEN.to_string(),
            mock_token: DEFAULT_TOKEN.to_string(),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
        }
    }
}

impl Config {
    /// Resolve every setting from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve every setting through `lookup`, falling back to defaults for
    /// keys it does not know.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let text = |key: &str, fallback: String| lookup(key).unwrap_or(fallback);

        let timeout = match lookup("REQUEST_TIMEOUT") {
            Some(value) => {
                let secs = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|source| ConfigError::InvalidTimeout { value, source })?;
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };
        let ssl_verify = lookup("SSL_VERIFY")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(defaults.ssl_verify);

        Ok(Self {
            api_base_url: text("API_BASE_URL", defaults.api_base_url),
            jsonplaceholder_base_url: text(
                "JSONPLACEHOLDER_BASE_URL",
                defaults.jsonplaceholder_base_url,
            ),
            inventory_base_url: text("INVENTORY_BASE_URL", defaults.inventory_base_url),
            timeout,
            ssl_verify,
            default_headers: defaults.default_headers,
            credentials: Credentials::new(
                text("API_TEST_USERNAME", defaults.credentials.email),
                text("API_TEST_PASSWORD", defaults.credentials.password),
            ),
            fixed_token: text("API_FIXED_TOKEN", defaults.fixed_token),
            mock_token: text("REQRES_MOCK_TOKEN", defaults.mock_token),
            report_path: lookup("REPORT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.report_path),
        })
    }

    /// Process-wide configuration, resolved from the environment on first use.
    pub fn global() -> Result<&'static Config, ConfigError> {
        GLOBAL.get_or_try_init(Config::from_env)
    }

    /// Login endpoint of the user-management sandbox.
    pub fn login_url(&self) -> String {
        format!("{}{LOGIN_PATH}", self.api_base_url.trim_end_matches('/'))
    }

    /// `Authorization: Bearer <token>` as a header override.
    pub fn bearer_headers(token: &str) -> Headers {
        Headers::from([("Authorization", format!("Bearer {token}"))])
    }

    /// Auth override built from the pre-issued token.
    pub fn fixed_auth_headers(&self) -> Headers {
        Self::bearer_headers(&self.fixed_token)
    }
}

fn default_headers() -> Headers {
    Headers::from([("User-Agent", USER_AGENT), ("Content-Type", CONTENT_TYPE_JSON)])
}
