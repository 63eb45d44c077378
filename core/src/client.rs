//! Stateful HTTP client facade for the sandbox services.
//!
//! # Design
//! `ApiClient` is owned by the caller; there is no process-wide instance.
//! It keeps the session state (current base URL, default headers, bearer
//! token) and turns each call into a fully resolved `HttpRequest` before
//! handing it to its `Transport`. Splitting `build_request` from `send`
//! keeps header merging and default handling testable without I/O.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::config::{Config, CONTENT_TYPE_JSON};
use crate::error::ApiError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};
use crate::retry::{Sleeper, ThreadSleeper};
use crate::transport::{Transport, UreqTransport};

const AUTHORIZATION: &str = "Authorization";
const CONTENT_TYPE: &str = "Content-Type";

/// Per-call overrides. `None` means "use the configured default"; an
/// explicit `Some(false)` or zero timeout is honored as given.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Option<Headers>,
    pub params: Vec<(String, String)>,
    pub verify: Option<bool>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name, value);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = Some(verify);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

pub struct ApiClient {
    config: Config,
    transport: Box<dyn Transport>,
    pub(crate) sleeper: Box<dyn Sleeper>,
    base_url: String,
    default_headers: Headers,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client over the blocking `ureq` transport, starting on the
    /// user-management sandbox.
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, UreqTransport)
    }

    /// Client configured from the process environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(Config::global()?.clone()))
    }

    pub fn with_transport(config: Config, transport: impl Transport + 'static) -> Self {
        let mut default_headers = config.default_headers.clone();
        if !default_headers.contains(CONTENT_TYPE) {
            default_headers.insert(CONTENT_TYPE, CONTENT_TYPE_JSON);
        }
        Self {
            base_url: config.api_base_url.clone(),
            default_headers,
            token: None,
            transport: Box::new(transport),
            sleeper: Box::new(ThreadSleeper),
            config,
        }
    }

    /// Replace the delay function used between login attempts.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn state(&self) -> SessionState {
        if self.token.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    // -----------------------------------------------------------------------
    // Session mutation
    // -----------------------------------------------------------------------

    pub fn switch_to(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
        debug!(base_url = %self.base_url, "switched environment");
    }

    pub fn switch_to_reqres(&mut self) {
        self.switch_to(self.config.api_base_url.clone());
    }

    pub fn switch_to_jsonplaceholder(&mut self) {
        self.switch_to(self.config.jsonplaceholder_base_url.clone());
    }

    pub fn switch_to_inventory(&mut self) {
        self.switch_to(self.config.inventory_base_url.clone());
    }

    pub fn set_default_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.default_headers.insert(name, value);
    }

    /// Remove a default header. `Content-Type` cannot be removed; the call
    /// returns `None` for it and leaves it in place.
    pub fn remove_default_header(&mut self, name: &str) -> Option<String> {
        if name.eq_ignore_ascii_case(CONTENT_TYPE) {
            return None;
        }
        self.default_headers.remove(name)
    }

    /// Store `token` and send it as a bearer credential on later calls.
    pub(crate) fn authorize(&mut self, token: &str) {
        self.default_headers
            .insert(AUTHORIZATION, format!("Bearer {token}"));
        self.token = Some(token.to_string());
    }

    pub(crate) fn store_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    /// Drop the stored token and its `Authorization` default header.
    pub fn clear_token(&mut self) {
        self.token = None;
        self.default_headers.remove(AUTHORIZATION);
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Defaults with `overrides` applied per key.
    pub fn effective_headers(&self, overrides: Option<&Headers>) -> Headers {
        match overrides {
            Some(overrides) => self.default_headers.merged(overrides),
            None => self.default_headers.clone(),
        }
    }

    /// Absolute URLs pass through; anything else is a path on the current
    /// base URL.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if url.starts_with('/') {
            format!("{base}{url}")
        } else {
            format!("{base}/{url}")
        }
    }

    pub fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        json: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<HttpRequest, ApiError> {
        let body = json
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            url: self.resolve_url(url),
            headers: self.effective_headers(options.headers.as_ref()),
            params: options.params.clone(),
            body,
            verify: options.verify.unwrap_or(self.config.ssl_verify),
            timeout: options.timeout.unwrap_or(self.config.timeout),
        })
    }

    pub fn get(&self, url: &str, options: &RequestOptions) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(HttpMethod::Get, url, None, options)?;
        self.send(&request)
    }

    pub fn post(
        &self,
        url: &str,
        json: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(HttpMethod::Post, url, json, options)?;
        self.send(&request)
    }

    pub fn put(
        &self,
        url: &str,
        json: Option<&Value>,
        options: &RequestOptions,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(HttpMethod::Put, url, json, options)?;
        self.send(&request)
    }

    pub(crate) fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self
            .transport
            .execute(request)
            .map_err(|source| ApiError::Transport {
                method: request.method,
                url: request.url.clone(),
                source,
            })?;
        debug!(method = %request.method, url = %request.url, status = response.status, "response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::error::{TransportError, TransportErrorKind};

    /// Transport that records every request and answers 200 with `{}`.
    fn recording() -> (impl Transport, Rc<RefCell<Vec<HttpRequest>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let transport = move |req: &HttpRequest| -> Result<HttpResponse, TransportError> {
            sink.borrow_mut().push(req.clone());
            Ok(HttpResponse {
                status: 200,
                headers: Headers::new(),
                body: "{}".to_string(),
            })
        };
        (transport, seen)
    }

    fn config() -> Config {
        Config {
            api_base_url: "http://users.test".to_string(),
            jsonplaceholder_base_url: "http://posts.test".to_string(),
            inventory_base_url: "http://store.test".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn no_override_sends_defaults_exactly() {
        let (transport, seen) = recording();
        let client = ApiClient::with_transport(config(), transport);
        client.get("/api/users/2", &RequestOptions::new()).unwrap();
        let seen = seen.borrow();
        assert_eq!(seen[0].headers, config().default_headers);
    }

    #[test]
    fn override_replaces_per_key_and_keeps_others() {
        let (transport, seen) = recording();
        let client = ApiClient::with_transport(config(), transport);
        let options = RequestOptions::new()
            .header("content-type", "text/plain")
            .header("Authorization", "Bearer abc");
        client.get("/api/users/2", &options).unwrap();

        let headers = &seen.borrow()[0].headers;
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("Authorization"), Some("Bearer abc"));
        assert!(headers.get("User-Agent").is_some());
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn omitted_verify_and_timeout_use_config() {
        let (transport, seen) = recording();
        let cfg = Config {
            ssl_verify: true,
            timeout: Duration::from_secs(7),
            ..config()
        };
        let client = ApiClient::with_transport(cfg, transport);
        client.get("/x", &RequestOptions::new()).unwrap();
        client
            .get("/x", &RequestOptions::new().verify(false).timeout(Duration::ZERO))
            .unwrap();

        let seen = seen.borrow();
        assert!(seen[0].verify);
        assert_eq!(seen[0].timeout, Duration::from_secs(7));
        assert!(!seen[1].verify);
        assert_eq!(seen[1].timeout, Duration::ZERO);
    }

    #[test]
    fn post_and_put_carry_json_body_and_params() {
        let (transport, seen) = recording();
        let client = ApiClient::with_transport(config(), transport);
        let payload = json!({"name": "auto_test_qa", "job": "automation_engineer"});
        client
            .post("/api/users", Some(&payload), &RequestOptions::new().param("page", "2"))
            .unwrap();
        client.put("/api/users/2", None, &RequestOptions::new()).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen[0].method, HttpMethod::Post);
        let body: Value = serde_json::from_str(seen[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, payload);
        assert_eq!(seen[0].params, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(seen[1].method, HttpMethod::Put);
        assert!(seen[1].body.is_none());
    }

    #[test]
    fn relative_urls_follow_the_current_environment() {
        let (transport, seen) = recording();
        let mut client = ApiClient::with_transport(config(), transport);
        client.get("/api/users/2", &RequestOptions::new()).unwrap();
        client.switch_to_jsonplaceholder();
        client.get("posts/1", &RequestOptions::new()).unwrap();
        client.switch_to_inventory();
        client.get("/products", &RequestOptions::new()).unwrap();
        client.get("https://elsewhere.test/abs", &RequestOptions::new()).unwrap();
        client.switch_to_reqres();
        assert_eq!(client.base_url(), "http://users.test");

        let urls: Vec<String> = seen.borrow().iter().map(|r| r.url.clone()).collect();
        assert_eq!(
            urls,
            vec![
                "http://users.test/api/users/2",
                "http://posts.test/posts/1",
                "http://store.test/products",
                "https://elsewhere.test/abs",
            ]
        );
    }

    #[test]
    fn transport_failure_is_wrapped_not_swallowed() {
        let transport = |_: &HttpRequest| -> Result<HttpResponse, TransportError> {
            Err(TransportError::new(
                TransportErrorKind::Timeout,
                "timed out reading response",
            ))
        };
        let client = ApiClient::with_transport(config(), transport);
        let err = client
            .post("/api/users", None, &RequestOptions::new())
            .unwrap_err();
        assert!(err.is_transport());
        let message = err.to_string();
        assert!(message.contains("POST"), "{message}");
        assert!(message.contains("http://users.test/api/users"), "{message}");
        assert!(message.contains("timed out reading response"), "{message}");
    }

    #[test]
    fn error_statuses_are_returned_as_responses() {
        let transport = |_: &HttpRequest| -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse {
                status: 404,
                headers: Headers::new(),
                body: "{}".to_string(),
            })
        };
        let client = ApiClient::with_transport(config(), transport);
        let response = client.get("/api/users/23", &RequestOptions::new()).unwrap();
        assert_eq!(response.status, 404);
    }

    #[test]
    fn content_type_is_always_present() {
        let (transport, _) = recording();
        let cfg = Config {
            default_headers: Headers::from([("User-Agent", "ua")]),
            ..config()
        };
        let mut client = ApiClient::with_transport(cfg, transport);
        assert_eq!(client.default_headers().get("content-type"), Some(CONTENT_TYPE_JSON));
        assert!(client.remove_default_header("CONTENT-TYPE").is_none());
        assert!(client.default_headers().contains("Content-Type"));
        assert_eq!(client.remove_default_header("user-agent").as_deref(), Some("ua"));
    }

    #[test]
    fn from_env_starts_on_configured_sandbox() {
        let client = ApiClient::from_env().unwrap();
        let global = Config::global().unwrap();
        assert_eq!(client.base_url(), global.api_base_url);
        assert_eq!(client.config().timeout, global.timeout);
        assert_eq!(client.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn clear_token_returns_to_unauthenticated() {
        let (transport, _) = recording();
        let mut client = ApiClient::with_transport(config(), transport);
        client.authorize("abc");
        assert_eq!(client.state(), SessionState::Authenticated);
        assert_eq!(client.default_headers().get("authorization"), Some("Bearer abc"));
        client.clear_token();
        assert_eq!(client.state(), SessionState::Unauthenticated);
        assert!(client.token().is_none());
        assert!(!client.default_headers().contains("Authorization"));
    }
}
