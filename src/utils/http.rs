//! HTTP client construction for JSON-RPC transports.
//!
//! The middleware retry layer only absorbs short-lived transport hiccups on a single
//! endpoint. Rate limiting is left to the endpoint pool, which rotates
//! away from a throttled provider instead of hammering it.

use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
	default_on_request_failure, default_on_request_success, policies::ExponentialBackoff, Jitter,
	RetryTransientMiddleware, Retryable, RetryableStrategy,
};
use std::time::Duration;

/// Configuration for HTTP retry policies
#[derive(Debug, Clone)]
pub struct HttpRetryConfig {
	/// Maximum number of retries for transient errors
	pub max_retries: u32,
	/// Base duration for exponential backoff calculations
	pub base_for_backoff: u32,
	/// Initial backoff duration before the first retry
	pub initial_backoff: Duration,
	/// Maximum backoff duration for retries
	pub max_backoff: Duration,
	/// Jitter to apply to the backoff duration
	pub jitter: Jitter,
}

impl Default for HttpRetryConfig {
	fn default() -> Self {
		Self {
			max_retries: 1,
			base_for_backoff: 2,
			initial_backoff: Duration::from_millis(100),
			max_backoff: Duration::from_secs(1),
			jitter: Jitter::Full,
		}
	}
}

/// Retry strategy that leaves status codes handled by endpoint rotation untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientErrorRetryStrategy;

impl RetryableStrategy for TransientErrorRetryStrategy {
	fn handle(
		&self,
		res: &Result<reqwest::Response, reqwest_middleware::Error>,
	) -> Option<Retryable> {
		match res {
			Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
				Some(Retryable::Fatal)
			}
			Ok(response) => default_on_request_success(response),
			Err(error) => default_on_request_failure(error),
		}
	}
}

/// Creates a retryable HTTP client with middleware
///
/// # Arguments
/// * `config` - Configuration for retry policies
/// * `base_client` - The base HTTP client to use
///
/// # Returns
/// A `ClientWithMiddleware` that retries transient transport errors
pub fn create_retryable_http_client(
	config: &HttpRetryConfig,
	base_client: reqwest::Client,
) -> ClientWithMiddleware {
	let retry_policy = ExponentialBackoff::builder()
		.base(config.base_for_backoff)
		.retry_bounds(config.initial_backoff, config.max_backoff)
		.jitter(config.jitter)
		.build_with_max_retries(config.max_retries);

	ClientBuilder::new(base_client)
		.with(RetryTransientMiddleware::new_with_policy_and_strategy(
			retry_policy,
			TransientErrorRetryStrategy,
		))
		.build()
}

/// Builds the plain reqwest client shared by the pool and its health checks
pub fn create_base_http_client(request_timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
	reqwest::ClientBuilder::new()
		.pool_idle_timeout(Duration::from_secs(90))
		.pool_max_idle_per_host(32)
		.timeout(request_timeout)
		.connect_timeout(request_timeout.min(Duration::from_secs(20)))
		.build()
}
