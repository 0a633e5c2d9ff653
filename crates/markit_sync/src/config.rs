//! Configuration for the sync layer.

use crate::error::ConfigError;
use std::time::Duration;

/// Environment variable holding the service base URL.
pub const SERVICE_URL_ENV: &str = "MARKIT_SERVICE_URL";

/// Environment variable holding the public service key.
pub const SERVICE_KEY_ENV: &str = "MARKIT_SERVICE_KEY";

/// Connection settings for the hosted data service.
///
/// Built once at startup and passed into the gateway constructor; nothing in
/// the sync layer reads the environment on its own.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL of the service (e.g., "https://xyz.example.co").
    pub service_url: String,
    /// Public (anon) API key.
    pub service_key: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Interval at which polling change feeds re-fetch.
    pub poll_interval: Duration,
}

impl ServiceConfig {
    /// Creates a validated service configuration.
    pub fn new(
        service_url: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let service_url = service_url.into().trim().trim_end_matches('/').to_string();
        let service_key = service_key.into().trim().to_string();

        if service_url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        if !service_url.starts_with("http") {
            return Err(ConfigError::InvalidUrl(service_url));
        }
        if service_key.is_empty() {
            return Err(ConfigError::MissingKey);
        }

        Ok(Self {
            service_url,
            service_key,
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(5),
        })
    }

    /// Creates a configuration from `MARKIT_SERVICE_URL` and
    /// `MARKIT_SERVICE_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var(SERVICE_URL_ENV).map_err(|_| ConfigError::MissingUrl)?;
        let key = std::env::var(SERVICE_KEY_ENV).map_err(|_| ConfigError::MissingKey)?;
        Self::new(url, key)
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Configuration for the sync controller.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Retry behaviour when the change stream drops.
    pub resubscribe: RetryConfig,
    /// Re-fetch the full list at this interval to recover missed events.
    pub reconcile_interval: Option<Duration>,
    /// Re-fetch after the first subscribe of a session and after every
    /// successful resubscribe.
    pub reconcile_on_resubscribe: bool,
}

impl SyncConfig {
    /// Creates the default sync configuration.
    pub fn new() -> Self {
        Self {
            resubscribe: RetryConfig::new(8),
            reconcile_interval: None,
            reconcile_on_resubscribe: true,
        }
    }

    /// Sets the resubscribe retry configuration.
    pub fn with_resubscribe(mut self, retry: RetryConfig) -> Self {
        self.resubscribe = retry;
        self
    }

    /// Enables periodic reconciliation.
    pub fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = Some(interval);
        self
    }

    /// Enables or disables the re-fetch that follows each subscribe.
    pub fn with_reconcile_on_resubscribe(mut self, enabled: bool) -> Self {
        self.reconcile_on_resubscribe = enabled;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    ///
    /// Values below 1.0 and non-finite values are clamped to 1.0.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = if multiplier.is_finite() {
            multiplier.max(1.0)
        } else {
            1.0
        };
        self
    }

    /// Enables or disables jitter.
    pub fn with_jitter(mut self, enabled: bool) -> Self {
        self.add_jitter = enabled;
        self
    }

    /// Calculates the delay before retry `attempt` (1-indexed; 0 is no delay).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);

        let max_secs = self.max_delay.as_secs_f64();
        let delay_secs = if base_delay.is_finite() && base_delay >= 0.0 {
            base_delay.min(max_secs)
        } else {
            max_secs
        };

        if self.add_jitter {
            // up to 25% jitter
            let jitter = delay_secs * 0.25 * rand::random::<f64>();
            Duration::from_secs_f64(delay_secs + jitter)
        } else {
            Duration::from_secs_f64(delay_secs)
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}
