//! Gas price and gas limit computation.
//!
//! Prices and limits are computed in `U256`/`Decimal` and truncated at the end. The
//! gas limit falls back in three steps when simulation fails: a gateway class
//! provider error is answered from the latest block gas limit, any other error from
//! the static override, and only without an override is the error surfaced.

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use alloy::primitives::U256;
use tracing::{debug, instrument, warn};

use crate::{
	models::{CallRequest, GasConfig, TransactionOptions},
	services::{
		blockchain::{abi, BlockChainError, BlockchainTransport, ContractBinding, RpcParameters},
		transaction::TransactionError,
	},
	utils::{
		constants::{REVEAL_METHOD, TO_ASSIGN_METHOD, TRANSFER_GAS_LIMIT},
		math::{gwei_to_wei, increase_gas_limit_value, multiply_by_decimal, multiply_gas},
	},
};

/// Last successful gas estimate per contract method, before the multiplier
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct GasLimitCache {
	entries: Arc<Mutex<HashMap<String, u64>>>,
}

impl GasLimitCache {
	pub fn get(&self, method: &str) -> Option<u64> {
		self.entries
			.lock()
			.ok()
			.and_then(|entries| entries.get(method).copied())
	}

	pub fn record(&self, method: &str, gas: u64) {
		if let Ok(mut entries) = self.entries.lock() {
			entries.insert(method.to_string(), gas);
		}
	}
}

/// Computes gas price and gas limit for one network's gas settings
#[derive(Debug, Clone)]
pub struct GasEstimator {
	config: GasConfig,
	/// Contract answering `toAssign()` for reveal estimates
	assignment_source: Option<ContractBinding>,
	last_known: GasLimitCache,
}

impl GasEstimator {
	pub fn new(config: GasConfig) -> Self {
		Self {
			config,
			assignment_source: None,
			last_known: GasLimitCache::default(),
		}
	}

	/// Uses `binding` to look up the number of values to assign for reveals
	pub fn with_assignment_source(mut self, binding: ContractBinding) -> Self {
		self.assignment_source = Some(binding);
		self
	}

	/// Shares last-known estimates with other estimators
	pub fn with_cache(mut self, cache: GasLimitCache) -> Self {
		self.last_known = cache;
		self
	}

	pub fn config(&self) -> &GasConfig {
		&self.config
	}

	/// Pre-multiplier gas price: the larger of the floor and the suggested price
	///
	/// Without a suggestion the floor is used as is, even when it is zero.
	pub fn resolve_base_gas_price(floor: U256, suggested: Option<U256>) -> U256 {
		suggested.map_or(floor, |suggested| suggested.max(floor))
	}

	/// Gas price in wei: `max(floor, suggested) * gas_multiplier`
	///
	/// Never fails. When the node cannot suggest a price and no floor is configured the
	/// result is zero, which is logged and left to the caller.
	#[instrument(skip_all)]
	pub async fn gas_price<T: BlockchainTransport>(&self, params: &RpcParameters<T>) -> U256 {
		let floor = gwei_to_wei(self.config.gas_price_gwei);

		let suggested = match params.suggest_gas_price_with_retry().await {
			Ok(price) => Some(price),
			Err(e) => {
				warn!(error = %e, "Failed to fetch suggested gas price, using configured floor");
				None
			}
		};

		let base = Self::resolve_base_gas_price(floor, suggested);
		let gas_price = multiply_by_decimal(base, self.config.gas_multiplier);
		if gas_price.is_zero() {
			warn!("Resolved gas price is zero");
		}
		debug!(%floor, ?suggested, %gas_price, "Resolved gas price");
		gas_price
	}

	/// Gas limit of the transaction described by `tx_options`
	///
	/// Plain transfers use the fixed transfer cost. Contract calls are simulated at
	/// `gas_price`; reveals also pay for every value to assign. The multiplier is
	/// applied to the simulated amount. A failed `toAssign()` read falls back the same
	/// way as a failed simulation.
	#[instrument(skip_all, fields(method = %tx_options.method_name))]
	pub async fn gas_limit<T: BlockchainTransport>(
		&self,
		params: &RpcParameters<T>,
		tx_options: &TransactionOptions,
		gas_price: U256,
	) -> Result<u64, TransactionError> {
		if tx_options.is_transfer() {
			return Ok(TRANSFER_GAS_LIMIT);
		}

		let data = abi::encode_call(
			&tx_options.abi,
			&tx_options.method_name,
			&tx_options.parameters,
		)?;
		let request = CallRequest {
			from: Some(tx_options.account),
			to: tx_options.contract_address,
			gas_price: Some(gas_price),
			value: tx_options.value,
			data,
		};

		let estimate = match params.estimate_gas_with_retry(&request).await {
			Ok(estimate) if tx_options.method_name == REVEAL_METHOD => self
				.reveal_surcharge(params, tx_options)
				.await
				.map(|surcharge| estimate.saturating_add(surcharge)),
			other => other,
		};

		match estimate {
			Ok(gas) => {
				self.last_known.record(&tx_options.method_name, gas);

				let gas_limit = multiply_gas(gas, self.config.gas_limit_multiplier);
				debug!(estimate = gas, gas_limit, "Estimated gas limit");
				Ok(gas_limit)
			}
			Err(e) if e.is_gateway_error() => {
				warn!(error = %e, "Gas estimation hit a gateway error, using latest block gas limit");
				self.gateway_fallback(params, &tx_options.method_name).await
			}
			Err(e) => match self.config.gas_limit_override {
				Some(gas_limit_override) => {
					warn!(error = %e, gas_limit_override, "Gas estimation failed, using override");
					Ok(gas_limit_override)
				}
				None => Err(e.into()),
			},
		}
	}

	/// Scales the last known limit, capped at the latest block gas limit
	async fn gateway_fallback<T: BlockchainTransport>(
		&self,
		params: &RpcParameters<T>,
		method: &str,
	) -> Result<u64, TransactionError> {
		let latest_block = match params.latest_block_with_retry().await {
			Ok(block) => block,
			Err(e) => {
				return match self.config.gas_limit_override {
					Some(gas_limit_override) => Ok(gas_limit_override),
					None => Err(TransactionError::GasEstimation(format!(
						"Failed to fetch latest block: {}",
						e
					))),
				}
			}
		};

		let block_gas_limit = latest_block.gas_limit();
		let base = self
			.last_known
			.get(method)
			.or(self.config.gas_limit_override)
			.unwrap_or(block_gas_limit);

		Ok(increase_gas_limit_value(
			base,
			self.config.gas_limit_multiplier,
			block_gas_limit,
		))
	}

	/// Extra gas a reveal needs for the values assigned to the staker
	async fn reveal_surcharge<T: BlockchainTransport>(
		&self,
		params: &RpcParameters<T>,
		tx_options: &TransactionOptions,
	) -> Result<u64, BlockChainError> {
		let source = match &self.assignment_source {
			Some(binding) => binding.clone(),
			None if tx_options.abi.function(TO_ASSIGN_METHOD).is_some() => ContractBinding::new(
				"reveal target",
				tx_options.contract_address,
				tx_options.abi.clone(),
			),
			None => {
				debug!("No toAssign source configured, reveal estimate left unchanged");
				return Ok(0);
			}
		};

		let values = source
			.call_with_retry(params, TO_ASSIGN_METHOD, &[])
			.await?;
		let to_assign = values
			.first()
			.and_then(|value| value.as_uint())
			.map(|(value, _)| value.saturating_to::<u64>())
			.ok_or_else(|| {
				BlockChainError::DecodeError("toAssign did not return an integer".to_string())
			})?;

		Ok(to_assign.saturating_mul(self.config.reveal_gas_per_assignment))
	}
}
