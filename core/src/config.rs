//! Transport configuration with field-by-field defaults.
//!
//! Every field is optional; `Transport::new` fills the gaps from the
//! constants below. There is no process-wide instance.

use std::env;
use std::fmt;
use std::time::Duration;

use url::Url;

use crate::context::ExecutionContext;
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_USER_AGENT: &str = concat!("account-client/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

pub const BASE_URL_ENV: &str = "ACCOUNT_API_BASE_URL";
pub const TIMEOUT_ENV: &str = "ACCOUNT_API_TIMEOUT_SECS";

#[derive(Clone, Default)]
pub struct TransportConfig {
    pub base_url: Option<Url>,
    pub user_agent: Option<String>,
    /// Only applied when `agent` is unset.
    pub timeout: Option<Duration>,
    pub agent: Option<ureq::Agent>,
    pub context: Option<ExecutionContext>,
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("agent", &self.agent.as_ref().map(|_| "<agent>"))
            .field("context", &self.context)
            .finish()
    }
}

impl TransportConfig {
    /// Read overrides from the environment.
    ///
    /// - `ACCOUNT_API_BASE_URL`: base URL of the account API
    /// - `ACCOUNT_API_TIMEOUT_SECS`: request timeout in whole seconds
    ///
    /// Unset variables leave the field at its default.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let mut config = Self::default();
        if let Some(raw) = lookup(BASE_URL_ENV) {
            config.base_url = Some(parse_base_url(&raw)?);
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            config.timeout = Some(parse_timeout_secs(&raw)?);
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_agent(mut self, agent: ureq::Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// Parse a base URL, rejecting anything that is not http(s).
pub fn parse_base_url(raw: &str) -> ApiResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ApiError::config(format!("invalid base url {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ApiError::config(format!("base url must be http or https, got {other}"))),
    }
}

fn parse_timeout_secs(raw: &str) -> ApiResult<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        ApiError::config(format!(
            "{TIMEOUT_ENV} must be a whole number of seconds, got {raw:?}"
        ))
    })?;
    Ok(Duration::from_secs(secs))
}

pub(crate) fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL is a valid url")
}

pub(crate) fn default_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .new_agent()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_leaves_everything_unset() {
        let config = TransportConfig::default();
        assert!(config.base_url.is_none());
        assert!(config.user_agent.is_none());
        assert!(config.timeout.is_none());
        assert!(config.agent.is_none());
        assert!(config.context.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let config = TransportConfig::default()
            .with_base_url(Url::parse("http://accountapi:8080").unwrap())
            .with_user_agent("tests/1.0")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url.unwrap().as_str(), "http://accountapi:8080/");
        assert_eq!(config.user_agent.as_deref(), Some("tests/1.0"));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(parse_base_url("https://api.example.com").is_ok());
        let err = parse_base_url("ftp://api.example.com").unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
        assert!(parse_base_url("not a url").is_err());
    }

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn from_vars_reads_base_url_and_timeout() {
        let config = TransportConfig::from_vars(vars(&[
            (BASE_URL_ENV, "http://accountapi:8080"),
            (TIMEOUT_ENV, " 30 "),
        ]))
        .unwrap();
        assert_eq!(config.base_url.unwrap().as_str(), "http://accountapi:8080/");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn from_vars_leaves_unset_fields_empty() {
        let config = TransportConfig::from_vars(vars(&[])).unwrap();
        assert!(config.base_url.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn from_vars_rejects_non_numeric_timeout() {
        let err = TransportConfig::from_vars(vars(&[(TIMEOUT_ENV, "ten")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)), "got {err:?}");
        assert!(err.to_string().contains(TIMEOUT_ENV));
    }

    #[test]
    fn from_vars_rejects_non_http_base_url() {
        let err =
            TransportConfig::from_vars(vars(&[(BASE_URL_ENV, "ftp://accountapi")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)), "got {err:?}");
    }

    #[test]
    fn from_env_reads_the_process_environment() {
        // only test that touches these variables
        env::set_var(TIMEOUT_ENV, "7");
        let config = TransportConfig::from_env();
        env::remove_var(TIMEOUT_ENV);
        assert_eq!(config.unwrap().timeout, Some(Duration::from_secs(7)));
    }

    #[test]
    fn default_base_url_matches_constant() {
        assert_eq!(default_base_url().as_str(), "http://localhost:8080/");
    }

    #[test]
    fn debug_hides_agent() {
        let config = TransportConfig::default().with_agent(default_agent(DEFAULT_TIMEOUT));
        assert!(format!("{config:?}").contains("<agent>"));
    }
}
