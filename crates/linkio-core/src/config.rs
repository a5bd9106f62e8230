use crate::error::{LinkIoError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// SDK configuration. Supplied once at initialization and immutable after.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SdkConfig {
    /// Domain whose links belong to this app, e.g. `example.com`.
    /// `www.` + domain matches as well.
    pub domain: String,

    /// Base URL of the attribution backend, e.g. `https://api.example.com`.
    pub backend_base_url: String,

    /// Optional custom URL scheme (e.g. `rokart` for `rokart://...`).
    #[serde(default)]
    pub app_scheme: Option<String>,

    /// Check for a deferred link whenever the app comes to the foreground. Default: true.
    #[serde(default = "default_true")]
    pub auto_check_pending_links: bool,

    /// Connect and total timeout for backend requests. Default: 30 seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Keep at most one pending-link request in flight. Default: true.
    #[serde(default = "default_true")]
    pub coalesce_pending_checks: bool,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

impl SdkConfig {
    pub fn new(domain: impl Into<String>, backend_base_url: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            backend_base_url: backend_base_url.into(),
            app_scheme: None,
            auto_check_pending_links: true,
            request_timeout_secs: default_timeout_secs(),
            coalesce_pending_checks: true,
        }
    }

    pub fn with_app_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.app_scheme = Some(scheme.into());
        self
    }

    pub fn with_auto_check_pending_links(mut self, enabled: bool) -> Self {
        self.auto_check_pending_links = enabled;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_coalesce_pending_checks(mut self, enabled: bool) -> Self {
        self.coalesce_pending_checks = enabled;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SdkConfig = toml::from_str(s)?;
        config.validate()
    }

    /// Read, parse and validate a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Check field constraints and normalize the backend URL.
    ///
    /// Consumes the config and returns it with any trailing `/` stripped
    /// from `backend_base_url`.
    pub fn validate(mut self) -> Result<Self> {
        let domain = self.domain.trim();
        if domain.is_empty() {
            return Err(LinkIoError::InvalidConfig("domain must not be empty".into()));
        }
        if domain.contains("://") || domain.contains('/') {
            return Err(LinkIoError::InvalidConfig(format!(
                "domain must be a bare host name, got '{}'",
                domain
            )));
        }
        self.domain = domain.to_ascii_lowercase();

        let base = self.backend_base_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base).map_err(|e| {
            LinkIoError::InvalidConfig(format!("backend_base_url '{}': {}", base, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(LinkIoError::InvalidConfig(format!(
                "backend_base_url must be an absolute http(s) URL, got '{}'",
                base
            )));
        }
        self.backend_base_url = base;

        self.app_scheme = self
            .app_scheme
            .as_deref()
            .map(|s| s.trim().trim_end_matches("://").to_ascii_lowercase())
            .filter(|s| !s.is_empty());
        if let Some(scheme) = self.app_scheme.as_deref() {
            if scheme == "http" || scheme == "https" {
                return Err(LinkIoError::InvalidConfig(format!(
                    "app_scheme must be a custom scheme, got '{}'",
                    scheme
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(LinkIoError::InvalidConfig(
                "request_timeout_secs must be at least 1".into(),
            ));
        }

        Ok(self)
    }

    pub fn pending_link_url(&self, device_id: &str) -> String {
        format!(
            "{}/api/pending-link/{}",
            self.backend_base_url,
            urlencoding::encode(device_id)
        )
    }

    pub fn track_referral_url(&self) -> String {
        format!("{}/api/track-referral", self.backend_base_url)
    }
}
