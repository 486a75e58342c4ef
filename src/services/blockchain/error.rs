//! Blockchain error types and handling.
//!
//! Every failure of the RPC layer is classified here as transient or fatal. The
//! retry policy consults [`BlockChainError::is_retryable`] and never retries a
//! fatal error.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Represents possible errors that can occur during blockchain operations
#[derive(Debug, Clone, Error)]
pub enum BlockChainError {
	/// The endpoint pool is empty or misconfigured
	#[error("Configuration error: {0}")]
	ConfigError(String),

	/// Every configured endpoint failed its connectivity check
	#[error("No healthy RPC endpoint available")]
	NoHealthyEndpoint,

	/// Errors related to network connectivity issues
	#[error("Connection error: {0}")]
	ConnectionError(String),

	/// The endpoint answered with a non-success HTTP status
	#[error("HTTP {status} {message}")]
	HttpError { status: u16, message: String },

	/// Errors related to malformed requests or invalid responses
	#[error("Request error: {0}")]
	RequestError(String),

	/// JSON-RPC error object returned by the node
	#[error("RPC error {code}: {message}")]
	RpcError { code: i64, message: String },

	/// A single attempt exceeded its client-side deadline
	#[error("Request timed out after {0:?}")]
	Timeout(Duration),

	/// The requested operation is not part of the method registry
	#[error("Method not found: {0}")]
	MethodNotFound(String),

	/// ABI encoding of call arguments failed
	#[error("Encoding error: {0}")]
	EncodingError(String),

	/// ABI decoding of return data failed
	#[error("Decoding error: {0}")]
	DecodeError(String),

	/// At least one element of a batch failed
	#[error("Batch call error: {0}")]
	BatchCallError(String),

	/// A batch element returned no data
	#[error("empty batch call result")]
	EmptyBatchResult,

	/// When a requested block cannot be found on the blockchain
	#[error("Block not found: {0}")]
	BlockNotFound(String),

	/// Internal errors within the blockchain client
	#[error("Internal error: {0}")]
	InternalError(String),
}

impl BlockChainError {
	/// Creates a new connection error with logging
	pub fn connection_error(msg: impl Into<String>) -> Self {
		let error = Self::ConnectionError(msg.into());
		debug!("{}", error);
		error
	}

	/// Creates a new request error with logging
	pub fn request_error(msg: impl Into<String>) -> Self {
		let error = Self::RequestError(msg.into());
		debug!("{}", error);
		error
	}

	/// Creates a new internal error with logging
	pub fn internal_error(msg: impl Into<String>) -> Self {
		let error = Self::InternalError(msg.into());
		debug!("{}", error);
		error
	}

	/// Whether another attempt, possibly against another endpoint, may succeed
	///
	/// Configuration, registry and ABI errors are deterministic and never retried.
	pub fn is_retryable(&self) -> bool {
		!matches!(
			self,
			Self::ConfigError(_)
				| Self::MethodNotFound(_)
				| Self::EncodingError(_)
				| Self::DecodeError(_)
				| Self::EmptyBatchResult
				| Self::InternalError(_)
		)
	}

	/// Whether the error is a gateway class failure of a hosted provider
	pub fn is_gateway_error(&self) -> bool {
		let message = self.to_string().to_lowercase();
		crate::utils::constants::GATEWAY_ERROR_PATTERNS
			.iter()
			.any(|pattern| message.contains(pattern))
	}
}
