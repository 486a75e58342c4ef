//! Retry mechanism for handling transient failures in async operations.
//!
//! Every network-facing call in the crate is wrapped by [`WithRetry`]. The policy is
//! expressed as a total attempt budget: an operation that always fails is invoked
//! exactly `max_retries` times, with exponential backoff between attempts.

use std::{fmt::Display, future::Future, time::Duration};

use serde::{Deserialize, Serialize};

use crate::utils::constants::{
	DEFAULT_INITIAL_RETRY_DELAY_MS, DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_DELAY_MS,
};

/// Configuration for retry behavior
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
	/// Total number of attempts before giving up (the first call included)
	pub max_retries: u32,

	/// Initial delay between attempts, doubled after each failure
	#[serde(with = "duration_millis", rename = "initial_delay_ms")]
	pub initial_delay: Duration,

	/// Upper bound for the delay between attempts
	#[serde(with = "duration_millis", rename = "max_delay_ms")]
	pub max_delay: Duration,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_retries: DEFAULT_MAX_RETRIES,
			initial_delay: Duration::from_millis(DEFAULT_INITIAL_RETRY_DELAY_MS),
			max_delay: Duration::from_millis(DEFAULT_MAX_RETRY_DELAY_MS),
		}
	}
}

impl RetryConfig {
	/// Returns the delay to wait after the given (1-based) failed attempt
	pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
		let factor = 1u32
			.checked_shl(attempt.saturating_sub(1))
			.unwrap_or(u32::MAX);
		self.initial_delay
			.checked_mul(factor)
			.unwrap_or(self.max_delay)
			.min(self.max_delay)
	}
}

/// Handler for retrying operations with exponential backoff
#[derive(Clone, Debug)]
pub struct WithRetry {
	config: RetryConfig,
}

impl WithRetry {
	/// Creates a new retry handler with custom configuration
	pub fn new(config: RetryConfig) -> Self {
		Self { config }
	}

	/// Creates a new retry handler with default configuration
	pub fn with_default_config() -> Self {
		Self::new(RetryConfig::default())
	}

	/// Attempts an async operation, retrying on every error
	pub async fn attempt<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: Display,
	{
		self.attempt_if(operation, |_| true).await
	}

	/// Attempts an async operation, retrying only the errors accepted by `should_retry`
	///
	/// The error of the last attempt is returned as-is once the attempt budget is spent
	/// or as soon as `should_retry` rejects an error.
	///
	/// # Arguments
	/// * `operation` - Factory producing a fresh future for every attempt
	/// * `should_retry` - Classifies an error as transient (`true`) or fatal (`false`)
	pub async fn attempt_if<F, Fut, T, E, P>(&self, mut operation: F, should_retry: P) -> Result<T, E>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: Display,
		P: Fn(&E) -> bool,
	{
		let mut attempt = 0u32;
		loop {
			match operation().await {
				Ok(value) => return Ok(value),
				Err(e) => {
					attempt += 1;
					if !should_retry(&e) {
						tracing::debug!(attempt, error = %e, "non-retryable error");
						return Err(e);
					}
					if attempt >= self.config.max_retries {
						tracing::warn!(attempt, error = %e, "retry budget exhausted");
						return Err(e);
					}

					let delay = self.config.delay_for_attempt(attempt);
					tracing::warn!(
						attempt,
						max_retries = self.config.max_retries,
						delay_ms = delay.as_millis() as u64,
						error = %e,
						"attempt failed, retrying"
					);
					tokio::time::sleep(delay).await;
				}
			}
		}
	}
}

mod duration_millis {
	use serde::{Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(value.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		u64::deserialize(deserializer).map(Duration::from_millis)
	}
}
