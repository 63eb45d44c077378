//! Blocking API client for the sandbox REST services used in integration
//! testing: a user-management sandbox, a placeholder JSON API, and a mock
//! inventory API.
//!
//! # Overview
//! `ApiClient` wraps GET/POST/PUT, merges default headers with per-call
//! overrides, applies timeout and TLS-verification defaults from `Config`,
//! and logs in (with retry, or with a mock-token fallback) to obtain a bearer
//! token it keeps for later calls.
//!
//! # Design
//! - The client is caller-owned; tests construct their own instance.
//! - Requests and responses are plain data (`HttpRequest`/`HttpResponse`);
//!   the network round-trip lives behind the `Transport` trait.
//! - Retry delays go through an injectable `Sleeper`, so retry behavior is
//!   tested without sleeping.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod login;
pub mod retry;
pub mod transport;
pub mod types;

pub use client::{ApiClient, RequestOptions, SessionState};
pub use config::{Config, Credentials};
pub use error::{ApiError, ConfigError, TransportError, TransportErrorKind};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse};
pub use login::{mask_token, LoginOutcome, DEFAULT_LOGIN_RETRIES, LOGIN_RETRY_DELAY};
pub use retry::{Sleeper, ThreadSleeper};
pub use transport::{Transport, UreqTransport};
