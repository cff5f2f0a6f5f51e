//! Client configuration.
//!
//! A [`ClientConfig`] is built once (from the environment, `.env`, or
//! explicit values) and handed to the transport at construction time.
//! Nothing here is global: two clients with different configs can coexist.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::ClientError;

/// Default API base path.
///
/// Relative to [`DEFAULT_API_ORIGIN`] unless an absolute URL is configured.
pub const DEFAULT_API_BASE_URL: &str = "/api";

/// Origin used to resolve a path-only base URL.
pub const DEFAULT_API_ORIGIN: &str = "http://localhost:8000";

/// Fallback shared-secret token.
///
/// Insecure: matches the backend's own fallback so local setups work,
/// and is logged as a warning whenever it ends up in use.
pub const DEFAULT_AUTH_TOKEN: &str = "changeme123";

/// Header carrying the shared-secret token.
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable names.
pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
pub const ENV_API_ORIGIN: &str = "API_ORIGIN";
pub const ENV_AUTH_TOKEN: &str = "AUTH_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";

/// Connection settings for the analysis backend.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    origin: String,
    auth_token: String,
    timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            origin: DEFAULT_API_ORIGIN.to_string(),
            auth_token: DEFAULT_AUTH_TOKEN.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a config with an explicit base URL and token.
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            ..Self::default()
        }
    }

    /// Resolve the config from the process environment.
    ///
    /// Loads `.env` first if present. Unset variables fall back to the
    /// defaults above.
    pub fn from_env() -> Result<Self, ClientError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve the config through an arbitrary lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_API_BASE_URL).filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().to_string();
        }
        if let Some(origin) = lookup(ENV_API_ORIGIN).filter(|v| !v.trim().is_empty()) {
            config.origin = origin.trim().to_string();
        }
        if let Some(token) = lookup(ENV_AUTH_TOKEN).filter(|v| !v.is_empty()) {
            config.auth_token = token;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientError::Config(format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the origin used for path-only base URLs.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the shared-secret token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the insecure fallback token is in use.
    pub fn uses_default_token(&self) -> bool {
        self.auth_token == DEFAULT_AUTH_TOKEN
    }

    /// Log a warning when the fallback token is configured.
    ///
    /// Call once the final token is known. Returns whether it warned.
    pub fn warn_if_insecure(&self) -> bool {
        let insecure = self.uses_default_token();
        if insecure {
            log::warn!("⚠️  Insecure default token in use; set {} or pass --token", ENV_AUTH_TOKEN);
        }
        insecure
    }

    /// Full URL for an endpoint such as `/products`.
    ///
    /// An absolute base is used as is; a path base is joined to the origin.
    pub fn url_for(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let endpoint = if endpoint.starts_with('/') {
            endpoint.to_string()
        } else {
            format!("/{}", endpoint)
        };

        if is_absolute(base) {
            format!("{}{}", base, endpoint)
        } else {
            let origin = self.origin.trim_end_matches('/');
            let base = base.trim_start_matches('/');
            if base.is_empty() {
                format!("{}{}", origin, endpoint)
            } else {
                format!("{}/{}{}", origin, base, endpoint)
            }
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("origin", &self.origin)
            .field("auth_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
