//! Executes an `HttpRequest` over the network.
//!
//! # Design
//! `ApiClient` never talks to the network directly; it hands a fully
//! resolved `HttpRequest` to a `Transport`. `UreqTransport` is the blocking
//! production implementation. Any `Fn(&HttpRequest) -> Result<..>` closure is
//! also a transport, which is how unit tests script responses.

use tracing::trace;

use crate::error::{TransportError, TransportErrorKind};
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};

pub trait Transport {
    /// Execute `request`. 4xx/5xx statuses are `Ok` responses; only failures
    /// to obtain a response are `Err`.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError>,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Blocking transport backed by `ureq`.
///
/// A new agent is built per request so each call gets its own timeout and
/// certificate-verification policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    fn agent(request: &HttpRequest) -> ureq::Agent {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(!request.verify)
            .build();
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(request.timeout))
            .tls_config(tls)
            .build()
            .new_agent()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = Self::agent(request);
        let body = request.body.as_deref().unwrap_or_default();

        let result = match request.method {
            HttpMethod::Get => decorate(agent.get(&request.url), request).call(),
            HttpMethod::Post => decorate(agent.post(&request.url), request).send(body.as_bytes()),
            HttpMethod::Put => decorate(agent.put(&request.url), request).send(body.as_bytes()),
        };
        let mut response = result.map_err(TransportError::from)?;

        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(TransportError::from)?;
        trace!(status, bytes = body.len(), "response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn decorate<B>(mut builder: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (name, value) in request.headers.iter() {
        builder = builder.header(name, value);
    }
    for (key, value) in &request.params {
        builder = builder.query(key, value);
    }
    builder
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        let kind = match &err {
            ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
            ureq::Error::HostNotFound | ureq::Error::ConnectionFailed | ureq::Error::Io(_) => {
                TransportErrorKind::Connection
            }
            _ => TransportErrorKind::Other,
        };
        TransportError::new(kind, err.to_string())
    }
}
