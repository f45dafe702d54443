use damagemap_core::bounds::BoundsConfig;
use damagemap_core::model::Vocabulary;
use damagemap_core::projection::ProjectionConfig;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `max_retries + 1`.
    pub max_retries: u32,
    /// Wait used on a rate limit when the service suggests no delay.
    pub rate_limit_wait: Duration,
    /// Upper limit on a delay suggested by the service.
    pub max_rate_limit_wait: Duration,
    /// Added to every rate-limit wait.
    pub rate_limit_buffer: Duration,
    /// Wait after any other failure.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            rate_limit_wait: Duration::from_secs(40),
            max_rate_limit_wait: Duration::from_secs(300),
            rate_limit_buffer: Duration::from_secs(5),
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before retrying a rate-limited attempt. A suggested delay is
    /// capped at `max_rate_limit_wait`; the buffer is added either way.
    pub fn rate_limit_delay(&self, suggested: Option<Duration>) -> Duration {
        suggested
            .map(|d| d.min(self.max_rate_limit_wait))
            .unwrap_or(self.rate_limit_wait)
            .saturating_add(self.rate_limit_buffer)
    }
}

#[derive(Debug, Clone)]
pub struct AssessConfig {
    pub bounds: BoundsConfig,
    pub projection: ProjectionConfig,
    pub vocabulary: Vocabulary,
    pub batch_size: usize,
    /// Fixed pause between consecutive batches, whatever their outcome.
    pub batch_pause: Duration,
    pub retry: RetryPolicy,
}

impl Default for AssessConfig {
    fn default() -> Self {
        Self {
            bounds: BoundsConfig::default(),
            projection: ProjectionConfig::default(),
            vocabulary: Vocabulary::default(),
            batch_size: 85,
            batch_pause: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("bounds margin must be finite and non-negative, got {0}")]
    BadMargin(f64),
    #[error("minimum coordinate range must be positive, got {0}")]
    BadRangeFloor(f64),
    #[error("duration must be a non-negative number of seconds, got {0}")]
    BadDuration(f64),
}

/// Seconds from a user-supplied number, rejecting values a `Duration`
/// cannot hold.
pub fn duration_from_secs(secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::BadDuration(secs))
}

impl AssessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if !(self.bounds.margin.is_finite() && self.bounds.margin >= 0.0) {
            return Err(ConfigError::BadMargin(self.bounds.margin));
        }
        if !(self.bounds.min_range_deg.is_finite() && self.bounds.min_range_deg > 0.0) {
            return Err(ConfigError::BadRangeFloor(self.bounds.min_range_deg));
        }
        Ok(())
    }
}
