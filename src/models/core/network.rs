use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::{
	constants::{DEFAULT_REVEAL_GAS_PER_ASSIGNMENT, DEFAULT_RPC_TIMEOUT_MS},
	RetryConfig,
};

/// A configured RPC endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RpcUrl {
	pub type_: String,
	pub url: String,
	pub weight: u32,
}

/// Gas pricing and limit settings applied to every transaction on a network
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GasConfig {
	/// Safety factor applied to the resolved gas price
	#[serde(default = "default_multiplier")]
	pub gas_multiplier: Decimal,

	/// Gas price floor in gwei, zero disables the floor
	#[serde(default)]
	pub gas_price_gwei: u64,

	/// Safety factor applied to the simulated gas limit
	#[serde(default = "default_multiplier")]
	pub gas_limit_multiplier: Decimal,

	/// Static gas limit used when estimation fails
	#[serde(default)]
	pub gas_limit_override: Option<u64>,

	/// Extra gas per assigned value added to reveal estimates
	#[serde(default = "default_reveal_gas_per_assignment")]
	pub reveal_gas_per_assignment: u64,
}

fn default_multiplier() -> Decimal {
	Decimal::ONE
}

fn default_reveal_gas_per_assignment() -> u64 {
	DEFAULT_REVEAL_GAS_PER_ASSIGNMENT
}

impl Default for GasConfig {
	fn default() -> Self {
		Self {
			gas_multiplier: default_multiplier(),
			gas_price_gwei: 0,
			gas_limit_multiplier: default_multiplier(),
			gas_limit_override: None,
			reveal_gas_per_assignment: default_reveal_gas_per_assignment(),
		}
	}
}

/// A blockchain network the staker talks to
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Network {
	pub slug: String,
	pub name: String,
	pub chain_id: u64,
	pub rpc_urls: Vec<RpcUrl>,
	#[serde(default)]
	pub gas: GasConfig,
	#[serde(default)]
	pub retry: RetryConfig,
	#[serde(default = "default_rpc_timeout_ms")]
	pub rpc_timeout_ms: u64,
}

fn default_rpc_timeout_ms() -> u64 {
	DEFAULT_RPC_TIMEOUT_MS
}

impl Network {
	/// Usable RPC endpoints ordered by descending weight
	///
	/// Endpoints of another type or with a zero weight are left out.
	pub fn weighted_rpc_urls(&self) -> Vec<&RpcUrl> {
		let mut rpc_urls: Vec<_> = self
			.rpc_urls
			.iter()
			.filter(|rpc_url| rpc_url.type_ == "rpc" && rpc_url.weight > 0)
			.collect();
		rpc_urls.sort_by(|a, b| b.weight.cmp(&a.weight));
		rpc_urls
	}

	/// Client-side timeout of a single RPC round trip
	pub fn rpc_timeout(&self) -> Duration {
		Duration::from_millis(self.rpc_timeout_ms)
	}
}
