//! Network configuration loading and validation.

use std::path::Path;

use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{ConfigLoader, Network};

use super::error::ConfigError;

const DEFAULT_NETWORKS_DIR: &str = "config/networks";

impl ConfigLoader for Network {
	fn load_all<T>(path: Option<&Path>) -> Result<T, ConfigError>
	where
		T: FromIterator<(String, Self)>,
	{
		let network_dir = path.unwrap_or(Path::new(DEFAULT_NETWORKS_DIR));
		let mut pairs = Vec::new();

		if !network_dir.exists() {
			return Err(ConfigError::file_error("networks directory not found"));
		}

		for entry in std::fs::read_dir(network_dir)? {
			let entry = entry?;
			let path = entry.path();

			if !Self::is_json_file(&path) {
				continue;
			}

			let name = path
				.file_stem()
				.and_then(|s| s.to_str())
				.unwrap_or("unknown")
				.to_string();

			match Self::load_from_path(&path) {
				Ok(network) => pairs.push((name, network)),
				Err(e) => warn!(file = %path.display(), error = %e, "Skipping network config"),
			}
		}

		Ok(T::from_iter(pairs))
	}

	fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
		let file = std::fs::File::open(path)?;
		let config: Network = serde_json::from_reader(file)?;

		config.validate()?;

		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		// Validate slug
		if self.slug.is_empty()
			|| !self
				.slug
				.chars()
				.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
		{
			return Err(ConfigError::validation_error(
				"Slug must contain only lowercase letters, numbers, and underscores",
			));
		}

		if self.chain_id == 0 {
			return Err(ConfigError::validation_error(
				"Chain id must be greater than 0",
			));
		}

		// Validate RPC URL types
		let supported_types = ["rpc"];
		if !self
			.rpc_urls
			.iter()
			.all(|rpc_url| supported_types.contains(&rpc_url.type_.as_str()))
		{
			return Err(ConfigError::validation_error(format!(
				"RPC URL type must be one of: {}",
				supported_types.join(", ")
			)));
		}

		// Validate RPC URLs format
		if !self.rpc_urls.iter().all(|rpc_url| {
			rpc_url.url.starts_with("http://") || rpc_url.url.starts_with("https://")
		}) {
			return Err(ConfigError::validation_error(
				"All RPC URLs must start with http:// or https://",
			));
		}

		// Validate RPC URL weights
		if !self.rpc_urls.iter().all(|rpc_url| rpc_url.weight <= 100) {
			return Err(ConfigError::validation_error(
				"All RPC URL weights must be between 0 and 100",
			));
		}

		if self.weighted_rpc_urls().is_empty() {
			return Err(ConfigError::validation_error(
				"At least one RPC URL with a non-zero weight is required",
			));
		}

		if self.gas.gas_multiplier <= Decimal::ZERO
			|| self.gas.gas_limit_multiplier <= Decimal::ZERO
		{
			return Err(ConfigError::validation_error(
				"Gas multipliers must be positive",
			));
		}

		if self.gas.gas_limit_override == Some(0) {
			return Err(ConfigError::validation_error(
				"Gas limit override must be greater than 0",
			));
		}

		if self.retry.max_retries == 0 {
			return Err(ConfigError::validation_error(
				"Retry budget must allow at least one attempt",
			));
		}

		if self.retry.initial_delay > self.retry.max_delay {
			return Err(ConfigError::validation_error(
				"Initial retry delay must not exceed the maximum delay",
			));
		}

		if self.rpc_timeout_ms == 0 {
			return Err(ConfigError::validation_error(
				"RPC timeout must be greater than 0",
			));
		}

		Ok(())
	}
}
