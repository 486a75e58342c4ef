//! Utility modules for common functionality.
//!
//! - constants: Tags, defaults and provider error patterns
//! - http: Retryable HTTP client construction
//! - logging: Logging setup
//! - math: Arbitrary precision gas arithmetic
//! - retry: Bounded exponential-backoff retry policy

pub mod constants;
pub mod http;
pub mod logging;
pub mod math;
pub mod retry;

pub use constants::*;
pub use retry::{RetryConfig, WithRetry};
