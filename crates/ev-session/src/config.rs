use std::time::Duration;

use crate::error::SessionError;

pub const DEFAULT_BACKEND_URL: &str = "https://magurofly.zapto.org/";
pub const DEFAULT_HOST_ORIGIN: &str = "https://atcoder.jp/";
pub const DEFAULT_AFFILIATION_FIELD: &str = "ui.Affiliation";
pub const DEFAULT_CREDENTIAL_SLOT: &str = "token";

/// Endpoints and knobs shared by the backend client and the host site client.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Origin the voting backend's endpoints live under.
    pub backend_url: String,
    /// Origin of the host site (profile settings, editorial pages).
    pub host_origin: String,
    /// Profile form field borrowed during the handshake.
    pub affiliation_field: String,
    /// Name of the durable slot holding the credential.
    pub credential_slot: String,
    /// Per-request timeout applied by both HTTP clients.
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            host_origin: DEFAULT_HOST_ORIGIN.into(),
            affiliation_field: DEFAULT_AFFILIATION_FIELD.into(),
            credential_slot: DEFAULT_CREDENTIAL_SLOT.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `EV_BACKEND_URL`, `EV_HOST_ORIGIN` and `EV_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, SessionError> {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("EV_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Ok(origin) = std::env::var("EV_HOST_ORIGIN") {
            config.host_origin = origin;
        }
        if let Ok(raw) = std::env::var("EV_TIMEOUT_MS") {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| SessionError::Config(format!("EV_TIMEOUT_MS '{raw}' is not a number")))?;
            config.timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_host_origin(mut self, origin: impl Into<String>) -> Self {
        self.host_origin = origin.into();
        self
    }
}

/// Parse an origin, treating its path as a directory so joins append to it.
pub(crate) fn parse_base_url(raw: &str) -> Result<url::Url, SessionError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    url::Url::parse(&normalized).map_err(|e| SessionError::Config(format!("invalid url '{raw}': {e}")))
}
