//! Builder for configuring client instances

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::FileCache;
use crate::client::{DEFAULT_BASE_URL, OpenDota};
use crate::limit::{RateLimit, RateLimiter};
use crate::{Result, RoshanError};

/// Default timeout for outbound requests (seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Builder for configuring [`OpenDota`] instances.
///
/// ```rust
/// # use roshan::OpenDota;
/// let client = OpenDota::builder()
///     .api_key("your-key")
///     .cache(false)
///     .build()
///     .unwrap();
/// ```
pub struct OpenDotaBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    cache_dir: Option<PathBuf>,
    cache_enabled: bool,
    rate_limit: Option<RateLimit>,
    limiter: Option<Arc<RateLimiter>>,
    timeout_secs: Option<u64>,
}

impl OpenDotaBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            cache_dir: None,
            cache_enabled: true,
            rate_limit: None,
            limiter: None,
            timeout_secs: None,
        }
    }

    /// Attach a credential. Authenticated clients get the higher
    /// [`RateLimit::authenticated`] ceiling unless a policy override is
    /// given.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Use a custom base URL (for testing with wiremock).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Root directory for the on-disk cache. Default: `~/.cache/roshan`.
    pub fn cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(path.into());
        self
    }

    /// Whether accessor methods consult and populate the cache by default.
    /// `dispatch` and `refresh` still honour their explicit modes.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Override the rate limit policy selected by credential presence.
    pub fn rate_limit(mut self, policy: RateLimit) -> Self {
        self.rate_limit = Some(policy);
        self
    }

    /// Share an existing limiter (and its budget) with this client.
    /// Takes precedence over [`rate_limit`](Self::rate_limit).
    pub fn shared_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Set the timeout for outbound requests (seconds).
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<OpenDota> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .map_err(|e| RoshanError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let limiter = match self.limiter {
            Some(shared) => shared,
            None => {
                let policy = self.rate_limit.unwrap_or_else(|| {
                    if self.api_key.is_some() {
                        RateLimit::authenticated()
                    } else {
                        RateLimit::anonymous()
                    }
                });
                Arc::new(RateLimiter::new(policy)?)
            }
        };

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let cache = FileCache::new(self.cache_dir.unwrap_or_else(FileCache::default_root));

        Ok(OpenDota::from_parts(
            http,
            base_url,
            self.api_key,
            cache,
            self.cache_enabled,
            limiter,
        ))
    }
}

impl Default for OpenDotaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
