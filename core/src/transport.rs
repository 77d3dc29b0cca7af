//! One HTTP round trip per call: shape the request, execute it, unwrap the
//! envelope.
//!
//! # Design
//! `Transport` owns only configuration fixed at construction, so a single
//! instance can be shared between threads. Request building
//! (`build_request`) and envelope decoding (`envelope::decode`) are pure;
//! only `execute` touches the network.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::{self, TransportConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::context::ExecutionContext;
use crate::envelope;
use crate::error::{ApiResult, TransportError};
use crate::http::{
    HttpMethod, HttpRequest, HttpResponse, APPLICATION_JSON, CONTENT_TYPE, USER_AGENT,
};

/// How often an in-flight cancellable request checks its context.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone)]
pub struct Transport {
    base_url: Url,
    user_agent: String,
    agent: ureq::Agent,
    context: ExecutionContext,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl Transport {
    /// Build a transport, falling back to defaults for every unset field.
    pub fn new(settings: TransportConfig) -> Self {
        let TransportConfig {
            base_url,
            user_agent,
            timeout,
            agent,
            context,
        } = settings;
        Self {
            base_url: base_url.unwrap_or_else(config::default_base_url),
            user_agent: user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            agent: agent
                .unwrap_or_else(|| config::default_agent(timeout.unwrap_or(DEFAULT_TIMEOUT))),
            context: context.unwrap_or_default(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        self.make_request(HttpMethod::Get, path, None)
    }

    /// POST `{"data": data}` and decode the response payload.
    pub fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        data: &B,
    ) -> ApiResult<Option<T>> {
        let body = envelope::encode(data)?;
        self.make_request(HttpMethod::Post, path, Some(body))
    }

    /// DELETE `path`. A response body, if any, is still decoded so an error
    /// envelope surfaces.
    pub fn delete(&self, path: &str) -> ApiResult<()> {
        self.make_request::<serde_json::Value>(HttpMethod::Delete, path, None)
            .map(|_| ())
    }

    /// Resolve `path` against the base URL and attach the fixed headers.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> ApiResult<HttpRequest> {
        let url = self.base_url.join(path)?;
        let mut headers = vec![(USER_AGENT.to_string(), self.user_agent.clone())];
        if body.is_some() {
            headers.push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
        }
        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    fn make_request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> ApiResult<Option<T>> {
        let request = self.build_request(method, path, body)?;
        let response = self.execute(request)?;
        envelope::decode(&response.body)
    }

    /// Run `request` under the transport's execution context.
    pub fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.context.check()?;
        let timeout = self.context.remaining();
        debug!(method = %request.method, url = %request.url, "dispatching request");
        let start = Instant::now();

        let result = if self.context.is_cancellable() {
            self.execute_cancellable(request, timeout)
        } else {
            dispatch(&self.agent, &request, timeout)
        };

        let response = result.map_err(|err| match err {
            TransportError::Http(ureq::Error::Timeout(_)) if self.context.check().is_err() => {
                TransportError::DeadlineExceeded
            }
            other => other,
        })?;
        debug!(
            status = response.status,
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            body_len = response.body.len(),
            "response received"
        );
        Ok(response)
    }

    /// Run the blocking call on a helper thread and poll the context so a
    /// cancellation is observed without waiting for the socket.
    fn execute_cancellable(
        &self,
        request: HttpRequest,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let (tx, rx) = mpsc::channel();
        let agent = self.agent.clone();
        thread::spawn(move || {
            // receiver is gone once the caller gave up
            let _ = tx.send(dispatch(&agent, &request, timeout));
        });

        loop {
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => return result,
                Err(mpsc::RecvTimeoutError::Timeout) => self.context.check()?,
                // helper thread died without answering
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::Cancelled)
                }
            }
        }
    }
}

fn dispatch(
    agent: &ureq::Agent,
    request: &HttpRequest,
    timeout: Option<Duration>,
) -> Result<HttpResponse, TransportError> {
    let url = request.url.as_str();
    let mut response = match (request.method, &request.body) {
        (HttpMethod::Get, _) => prepare(agent.get(url), request, timeout).call(),
        (HttpMethod::Delete, _) => prepare(agent.delete(url), request, timeout).call(),
        (HttpMethod::Post, Some(body)) => {
            prepare(agent.post(url), request, timeout).send(body.as_bytes())
        }
        (HttpMethod::Post, None) => prepare(agent.post(url), request, timeout).send_empty(),
    }?;

    let status = response.status().as_u16();
    // list reads the whole collection, so the body is not capped
    let body = response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_string()?;
    Ok(HttpResponse { status, body })
}

fn prepare<B>(
    builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
    timeout: Option<Duration>,
) -> ureq::RequestBuilder<B> {
    let builder = request
        .headers
        .iter()
        .fold(builder, |b, (name, value)| b.header(name.as_str(), value.as_str()));
    let builder = builder.config().http_status_as_error(false);
    match timeout {
        Some(left) => builder.timeout_global(Some(left)).build(),
        None => builder.build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn transport(base: &str) -> Transport {
        Transport::new(
            TransportConfig::default()
                .with_base_url(Url::parse(base).unwrap())
                .with_user_agent("account-tests/0.1"),
        )
    }

    #[test]
    fn defaults_are_applied() {
        let t = Transport::default();
        assert_eq!(t.base_url().as_str(), "http://localhost:8080/");
        assert_eq!(t.user_agent(), DEFAULT_USER_AGENT);
        assert!(t.context().check().is_ok());
    }

    #[test]
    fn get_request_has_no_body_or_content_type() {
        let req = transport("http://localhost:8080")
            .build_request(HttpMethod::Get, "/v1/organisation/accounts/abc", None)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8080/v1/organisation/accounts/abc");
        assert_eq!(req.header(USER_AGENT), Some("account-tests/0.1"));
        assert!(req.header(CONTENT_TYPE).is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn body_adds_content_type() {
        let req = transport("http://localhost:8080")
            .build_request(HttpMethod::Post, "/v1/organisation/accounts", Some("{}".to_string()))
            .unwrap();
        assert_eq!(req.header(CONTENT_TYPE), Some(APPLICATION_JSON));
        assert_eq!(req.body.as_deref(), Some("{}"));
    }

    #[test]
    fn relative_path_joins_base_directory() {
        let req = transport("http://api.local/prefix/")
            .build_request(HttpMethod::Get, "v1/organisation/accounts", None)
            .unwrap();
        assert_eq!(req.url, "http://api.local/prefix/v1/organisation/accounts");
    }

    #[test]
    fn absolute_reference_replaces_base() {
        let req = transport("http://api.local/prefix/")
            .build_request(HttpMethod::Get, "https://other.host/v1/organisation/accounts", None)
            .unwrap();
        assert_eq!(req.url, "https://other.host/v1/organisation/accounts");
    }

    #[test]
    fn query_survives_resolution() {
        let req = transport("http://localhost:8080")
            .build_request(HttpMethod::Delete, "/v1/organisation/accounts/abc?version=0", None)
            .unwrap();
        assert_eq!(req.url, "http://localhost:8080/v1/organisation/accounts/abc?version=0");
    }

    #[test]
    fn cancelled_context_fails_before_dispatch() {
        let (ctx, handle) = ExecutionContext::cancellable();
        handle.cancel();
        let t = Transport::new(TransportConfig::default().with_context(ctx));
        let err = t.get::<serde_json::Value>("/v1/organisation/accounts").unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::Cancelled)));
    }

    #[test]
    fn expired_deadline_fails_before_dispatch() {
        let ctx = ExecutionContext::background().with_deadline(Instant::now());
        let t = Transport::new(TransportConfig::default().with_context(ctx));
        let err = t.delete("/v1/organisation/accounts/abc?version=0").unwrap_err();
        assert!(matches!(err, ApiError::Transport(TransportError::DeadlineExceeded)));
    }
}
