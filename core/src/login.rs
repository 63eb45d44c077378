//! Login helpers on `ApiClient`.
//!
//! `login` retries with a fixed delay and fails loudly once attempts run out.
//! `reqres_login` never retries; it substitutes the configured mock token
//! when the sandbox rejects or blocks the call, and says so in its result.

use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use crate::client::{ApiClient, RequestOptions};
use crate::config::Credentials;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpResponse};
use crate::retry::{retry, Exhausted};

/// Retries after the first attempt when the caller has no preference.
pub const DEFAULT_LOGIN_RETRIES: u32 = 2;

/// Fixed pause between login attempts.
pub const LOGIN_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Token obtained by `reqres_login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The login endpoint issued this token.
    Issued(String),
    /// The endpoint failed or was unreachable; `token` is the configured
    /// mock token and `cause` describes what went wrong.
    Fallback { token: String, cause: String },
}

impl LoginOutcome {
    pub fn token(&self) -> &str {
        match self {
            LoginOutcome::Issued(token) => token,
            LoginOutcome::Fallback { token, .. } => token,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, LoginOutcome::Fallback { .. })
    }
}

impl ApiClient {
    /// Log in and keep the token for later calls.
    ///
    /// `url` defaults to the configured login endpoint and `credentials` to
    /// the configured test user. Makes at most `retry_count + 1` attempts;
    /// an attempt fails on a transport error, a non-2xx status, or a body
    /// without a `token` string. On success the token is stored and installed
    /// as an `Authorization: Bearer` default header. On failure any previous
    /// token is cleared.
    pub fn login(
        &mut self,
        url: Option<&str>,
        credentials: Option<&Credentials>,
        retry_count: u32,
    ) -> Result<String, ApiError> {
        let url = match url {
            Some(url) => self.resolve_url(url),
            None => self.config().login_url(),
        };
        let payload = login_payload(credentials.unwrap_or(&self.config().credentials))?;
        let request = self.build_request(HttpMethod::Post, &url, Some(&payload), &RequestOptions::new())?;

        let outcome = retry(
            "login",
            retry_count.saturating_add(1),
            LOGIN_RETRY_DELAY,
            self.sleeper.as_ref(),
            |_| self.send(&request).and_then(|response| extract_token(&url, &response)),
        );

        match outcome {
            Ok(token) => {
                info!(url = %url, token = %mask_token(&token), "login succeeded");
                self.authorize(&token);
                Ok(token)
            }
            Err(Exhausted { attempts, last }) => {
                warn!(url = %url, attempts, error = %last, "login failed");
                self.clear_token();
                Err(ApiError::LoginFailed {
                    url,
                    attempts,
                    last: Box::new(last),
                })
            }
        }
    }

    /// Single login against the user-management sandbox with the configured
    /// credentials.
    ///
    /// A non-200 status or a transport failure yields
    /// `LoginOutcome::Fallback` with the configured mock token. A 200 whose
    /// body has no token is an error and clears any stored token. Both `Ok`
    /// variants store the token.
    pub fn reqres_login(&mut self) -> Result<LoginOutcome, ApiError> {
        let url = self.config().login_url();
        let payload = login_payload(&self.config().credentials)?;

        let outcome = match self.post(&url, Some(&payload), &RequestOptions::new()) {
            Ok(response) if response.status == 200 => match extract_token(&url, &response) {
                Ok(token) => LoginOutcome::Issued(token),
                Err(e) => {
                    warn!(url = %url, error = %e, "login failed");
                    self.clear_token();
                    return Err(e);
                }
            },
            Ok(response) => LoginOutcome::Fallback {
                token: self.config().mock_token.clone(),
                cause: format!("HTTP {}: {}", response.status, response.body),
            },
            Err(e) => LoginOutcome::Fallback {
                token: self.config().mock_token.clone(),
                cause: e.to_string(),
            },
        };

        match &outcome {
            LoginOutcome::Issued(token) => {
                info!(url = %url, token = %mask_token(token), "login succeeded");
            }
            LoginOutcome::Fallback { token, cause } => {
                warn!(url = %url, token = %mask_token(token), cause = %cause, "using mock token");
            }
        }
        self.store_token(outcome.token());
        Ok(outcome)
    }
}

fn login_payload(credentials: &Credentials) -> Result<Value, ApiError> {
    serde_json::to_value(credentials).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn extract_token(url: &str, response: &HttpResponse) -> Result<String, ApiError> {
    if !response.is_success() {
        return Err(ApiError::HttpStatus {
            url: url.to_string(),
            status: response.status,
            body: response.body.clone(),
        });
    }
    let body: Value = serde_json::from_str(&response.body).unwrap_or(Value::Null);
    body.get("token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::MissingToken {
            url: url.to_string(),
        })
}

/// Keep the first four characters of a token, hide the rest.
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
