//! Account error types.

use alloy::primitives::Address;
use thiserror::Error;

/// Errors that can occur while resolving the signing key of an account
#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Keystore directory not found: {0}")]
	KeystoreDirNotFound(String),

	#[error("No keystore file found for account {0}")]
	KeyNotFound(Address),

	#[error("Failed to decrypt keystore of account {address}: {message}")]
	DecryptionError { address: Address, message: String },

	#[error("Keystore holds the key of {actual}, expected {expected}")]
	AddressMismatch { expected: Address, actual: Address },

	#[error("Keystore I/O error: {0}")]
	IoError(#[from] std::io::Error),

	#[error("Internal error: {0}")]
	InternalError(String),
}
