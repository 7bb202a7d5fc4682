use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HttpResult;

/// Environment variable that overrides the configured access token.
pub const TOKEN_ENV: &str = "DRIVEX_ACCESS_TOKEN";

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub api_base: String,
    pub upload_base: String,
    pub access_token: Option<String>,
    /// Whole-request limit for metadata calls, and the idle limit between
    /// chunks of a download. Upload bodies are not limited.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/drive/v3".into(),
            upload_base: "https://www.googleapis.com/upload/drive/v3".into(),
            access_token: None,
            timeout_secs: 60,
            connect_timeout_secs: 30,
            user_agent: concat!("drivex/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl HttpConfig {
    pub fn from_toml_str(s: &str) -> HttpResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Apply [`TOKEN_ENV`] if it is set and non-empty.
    pub fn with_env(self) -> Self {
        self.with_token_from(std::env::var(TOKEN_ENV).ok())
    }

    fn with_token_from(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.access_token = Some(token.trim().to_string());
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConfig")
            .field("api_base", &self.api_base)
            .field("upload_base", &self.upload_base)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
