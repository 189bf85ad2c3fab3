use std::time::Duration;

use crate::{AtmError, Result};

/// Exponential backoff schedule for the request loop.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after each further failure. Must be > 1.
    pub backoff_factor: f64,
    /// Total number of attempts, including the first one. Must be >= 1.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Builds a validated policy.
    pub fn new(initial_delay_ms: u64, backoff_factor: f64, max_attempts: u32) -> Result<Self> {
        let policy = Self {
            initial_delay_ms,
            backoff_factor,
            max_attempts,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(AtmError::Config("max_attempts must be at least 1".to_owned()));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 1.0 {
            return Err(AtmError::Config(format!(
                "backoff_factor must be a finite number greater than 1, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }

    /// Delay to wait after failed attempt `attempt` (1-indexed), before the next one.
    ///
    /// `initial_delay * backoff_factor^(attempt - 1)`, rounded to whole
    /// nanoseconds and saturating at `u64::MAX` nanoseconds.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let nanos = (self.initial_delay_ms as f64 * 1e6 * self.backoff_factor.powi(exp)).round();
        if nanos.is_nan() || nanos <= 0.0 {
            Duration::ZERO
        } else if nanos >= u64::MAX as f64 {
            Duration::from_nanos(u64::MAX)
        } else {
            Duration::from_nanos(nanos as u64)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 200,
            backoff_factor: 2.0,
            max_attempts: 5,
        }
    }
}

/// Configures HTTP timeout and retry behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl ClientOptions {
    /// Checks the timeout and the retry policy.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(AtmError::Config("timeout_ms must be greater than 0".to_owned()));
        }
        self.retry.validate()
    }

    /// Per-attempt timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reads option overrides from the environment, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `ADTECHMEDIA_TIMEOUT_MS`
    /// - `ADTECHMEDIA_MAX_TRIES`
    /// - `ADTECHMEDIA_MIN_DELAY_MS`
    /// - `ADTECHMEDIA_FACTOR`
    pub fn from_env() -> std::result::Result<Self, String> {
        let mut options = Self::default();
        if let Some(value) = env_parse("ADTECHMEDIA_TIMEOUT_MS")? {
            options.timeout_ms = value;
        }
        if let Some(value) = env_parse("ADTECHMEDIA_MAX_TRIES")? {
            options.retry.max_attempts = value;
        }
        if let Some(value) = env_parse("ADTECHMEDIA_MIN_DELAY_MS")? {
            options.retry.initial_delay_ms = value;
        }
        if let Some(value) = env_parse("ADTECHMEDIA_FACTOR")? {
            options.retry.backoff_factor = value;
        }
        options.validate().map_err(|err| err.to_string())?;
        Ok(options)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            retry: RetryPolicy::default(),
        }
    }
}

fn env_parse<T>(name: &str) -> std::result::Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|err| format!("{name} is not valid: {err}")),
        Err(_) => Ok(None),
    }
}
