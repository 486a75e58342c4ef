//! Encrypted JSON keystore lookup and decryption.

use std::path::{Path, PathBuf};

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use crate::services::account::{AccountError, AccountProvider};

/// The only keystore field needed to find the file of an account
#[derive(Deserialize)]
struct KeystoreHeader {
	address: Option<String>,
}

/// Account provider backed by a directory of encrypted JSON keystores
#[derive(Debug, Clone, Copy, Default)]
pub struct KeystoreAccount;

impl KeystoreAccount {
	pub fn new() -> Self {
		Self
	}

	/// Finds the keystore file of `address` inside `keystore_dir`
	///
	/// A file matches when its `address` field or its file name contains the hex
	/// address, compared case-insensitively and without the `0x` prefix.
	pub fn find_keystore_file(keystore_dir: &Path, address: Address) -> Result<PathBuf, AccountError> {
		if !keystore_dir.is_dir() {
			return Err(AccountError::KeystoreDirNotFound(
				keystore_dir.display().to_string(),
			));
		}

		let wanted = hex::encode(address.as_slice());

		let mut entries: Vec<PathBuf> = std::fs::read_dir(keystore_dir)?
			.filter_map(|entry| entry.ok().map(|entry| entry.path()))
			.filter(|path| path.is_file())
			.collect();
		entries.sort();

		for path in entries {
			let name_matches = path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(|name| name.to_lowercase().contains(&wanted));

			let field_matches = std::fs::read(&path)
				.ok()
				.and_then(|content| serde_json::from_slice::<KeystoreHeader>(&content).ok())
				.and_then(|header| header.address)
				.is_some_and(|field| {
					field.trim_start_matches("0x").to_lowercase() == wanted
				});

			if field_matches || name_matches {
				return Ok(path);
			}
		}

		Err(AccountError::KeyNotFound(address))
	}
}

#[async_trait]
impl AccountProvider for KeystoreAccount {
	#[instrument(skip(self, password))]
	async fn signer(
		&self,
		address: Address,
		password: &str,
		keystore_path: &Path,
	) -> Result<PrivateKeySigner, AccountError> {
		let keystore_file = Self::find_keystore_file(keystore_path, address)?;
		debug!(file = %keystore_file.display(), "Decrypting keystore");

		// Key derivation is CPU bound, keep it off the async workers
		let password = Zeroizing::new(password.to_string());
		let signer = tokio::task::spawn_blocking(move || {
			PrivateKeySigner::decrypt_keystore(&keystore_file, password.as_bytes())
		})
		.await
		.map_err(|e| AccountError::InternalError(e.to_string()))?
		.map_err(|e| AccountError::DecryptionError {
			address,
			message: e.to_string(),
		})?;

		if signer.address() != address {
			return Err(AccountError::AddressMismatch {
				expected: address,
				actual: signer.address(),
			});
		}

		Ok(signer)
	}
}
