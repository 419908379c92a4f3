//! Client configuration.

/// Base URL used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://jsbin.com/api/";

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "JSBIN_TOKEN";

/// Environment variable overriding the endpoint.
pub const ENDPOINT_ENV: &str = "JSBIN_ENDPOINT";

/// Immutable settings for one client.
///
/// `headers` are caller-supplied and sent with every request. They win over
/// the default `content-type`, but never over the authorization header
/// derived from `token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub token: Option<String>,
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `JSBIN_TOKEN` and `JSBIN_ENDPOINT`; empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let mut config = Self::default();
        config.token = non_empty(TOKEN_ENV);
        if let Some(endpoint) = non_empty(ENDPOINT_ENV) {
            config.endpoint = endpoint;
        }
        config
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Adds a header sent with every request. Names are stored lower-case.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .push((name.as_ref().to_ascii_lowercase(), value.into()));
        self
    }
}
