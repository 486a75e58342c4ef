//! Signing key resolution.
//!
//! Key material lives in encrypted JSON keystores (Web3 secret storage). The
//! [`AccountProvider`] trait is the seam the transaction builder depends on, so tests
//! can hand out in-memory signers instead.

mod error;
mod keystore;

use std::path::Path;

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use async_trait::async_trait;

pub use error::AccountError;
pub use keystore::KeystoreAccount;

/// Resolves the signing key of an account
#[async_trait]
pub trait AccountProvider: Send + Sync {
	/// Unlocks the key of `address` stored below `keystore_path` with `password`
	async fn signer(
		&self,
		address: Address,
		password: &str,
		keystore_path: &Path,
	) -> Result<PrivateKeySigner, AccountError>;
}
