//! Transaction construction, signing and submission.
//!
//! [`TransactionBuilder::build_transaction_options`] turns [`TransactionOptions`] into a
//! signed-ready [`TransactOpts`] handle in a fixed order: signing key, pending nonce,
//! gas price, chain-bound wallet, gas limit, value. The nonce is fetched from the node
//! on every build and never cached.
//!
//! Two concurrent submissions from the same account may still read the same pending
//! nonce; callers serialize submissions per account if that matters to them.

use std::{fmt, sync::Arc, time::Duration};

use alloy::{
	eips::eip2718::Encodable2718,
	network::{EthereumWallet, TransactionBuilder as _},
	primitives::{Address, Bytes, B256, U256},
	rpc::types::TransactionRequest,
	signers::Signer,
};
use tracing::{debug, info, instrument};

use crate::{
	models::{EvmReceipt, TransactionOptions},
	services::{
		account::AccountProvider,
		blockchain::{
			abi, BlockChainError, BlockchainTransport, ContractBinding, EvmClientTrait, RpcParameters,
		},
		transaction::{GasEstimator, GasLimitCache, TransactionError},
	},
	utils::constants::ALREADY_KNOWN_PATTERNS,
};

/// Everything needed to sign one transaction
#[derive(Clone)]
pub struct TransactOpts {
	pub from: Address,
	pub nonce: u64,
	pub gas_price: U256,
	pub gas_limit: u64,
	pub value: U256,
	pub chain_id: u64,
	wallet: EthereumWallet,
}

impl fmt::Debug for TransactOpts {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TransactOpts")
			.field("from", &self.from)
			.field("nonce", &self.nonce)
			.field("gas_price", &self.gas_price)
			.field("gas_limit", &self.gas_limit)
			.field("value", &self.value)
			.field("chain_id", &self.chain_id)
			.finish_non_exhaustive()
	}
}

impl TransactOpts {
	pub fn wallet(&self) -> &EthereumWallet {
		&self.wallet
	}

	/// Legacy transaction request calling `to` with `data`
	pub fn transaction_request(&self, to: Address, data: Bytes) -> TransactionRequest {
		TransactionRequest::default()
			.with_from(self.from)
			.with_to(to)
			.with_nonce(self.nonce)
			.with_chain_id(self.chain_id)
			.with_gas_price(self.gas_price.saturating_to::<u128>())
			.with_gas_limit(self.gas_limit)
			.with_value(self.value)
			.with_input(data)
	}

	/// Signs a call of `to` with `data`
	///
	/// Returns the transaction hash and the EIP-2718 encoded transaction.
	pub async fn sign(&self, to: Address, data: Bytes) -> Result<(B256, Bytes), TransactionError> {
		let envelope = self
			.transaction_request(to, data)
			.build(&self.wallet)
			.await
			.map_err(|e| TransactionError::Signing(e.to_string()))?;

		Ok((*envelope.tx_hash(), Bytes::from(envelope.encoded_2718())))
	}
}

/// Whether a broadcast failed only because the node already has the transaction
fn is_already_known(error: &BlockChainError) -> bool {
	let message = error.to_string().to_lowercase();
	ALREADY_KNOWN_PATTERNS
		.iter()
		.any(|pattern| message.contains(pattern))
}

/// Builds, signs and broadcasts transactions of workflow accounts
pub struct TransactionBuilder {
	account: Arc<dyn AccountProvider>,
	gas_cache: GasLimitCache,
	assignment_source: Option<ContractBinding>,
}

impl TransactionBuilder {
	pub fn new(account: Arc<dyn AccountProvider>) -> Self {
		Self {
			account,
			gas_cache: GasLimitCache::default(),
			assignment_source: None,
		}
	}

	/// Uses `binding` to look up the number of values to assign for reveals
	pub fn with_assignment_source(mut self, binding: ContractBinding) -> Self {
		self.assignment_source = Some(binding);
		self
	}

	/// Gas estimator for the gas settings of `tx_options`
	pub fn gas_estimator(&self, tx_options: &TransactionOptions) -> GasEstimator {
		let estimator =
			GasEstimator::new(tx_options.gas.clone()).with_cache(self.gas_cache.clone());
		match &self.assignment_source {
			Some(binding) => estimator.with_assignment_source(binding.clone()),
			None => estimator,
		}
	}

	/// Produces a ready-to-sign handle for `tx_options`
	///
	/// Any failing step fails the whole build. A failed gas estimation only passes when
	/// a gas limit override is configured.
	#[instrument(skip_all, fields(account = %tx_options.account, method = %tx_options.method_name))]
	pub async fn build_transaction_options<T: BlockchainTransport>(
		&self,
		params: &RpcParameters<T>,
		tx_options: &TransactionOptions,
	) -> Result<TransactOpts, TransactionError> {
		let signer = self
			.account
			.signer(
				tx_options.account,
				tx_options.password.as_str(),
				&tx_options.keystore_path,
			)
			.await?;

		let nonce = params.pending_nonce_with_retry(tx_options.account).await?;

		let gas = self.gas_estimator(tx_options);
		let gas_price = gas.gas_price(params).await;

		let signer = signer.with_chain_id(Some(tx_options.chain_id));
		let from = signer.address();
		let wallet = EthereumWallet::from(signer);

		let gas_limit = gas.gas_limit(params, tx_options, gas_price).await?;

		let value = tx_options.value.unwrap_or_default();

		debug!(nonce, %gas_price, gas_limit, %value, "Built transaction options");
		Ok(TransactOpts {
			from,
			nonce,
			gas_price,
			gas_limit,
			value,
			chain_id: tx_options.chain_id,
			wallet,
		})
	}

	/// Builds, signs and broadcasts the transaction described by `tx_options`
	///
	/// A broadcast the node reports as already known counts as sent and yields the
	/// locally computed hash.
	#[instrument(skip_all, fields(account = %tx_options.account, method = %tx_options.method_name))]
	pub async fn submit<T: BlockchainTransport>(
		&self,
		params: &RpcParameters<T>,
		tx_options: &TransactionOptions,
	) -> Result<B256, TransactionError> {
		let opts = self.build_transaction_options(params, tx_options).await?;

		let data = if tx_options.is_transfer() {
			Bytes::new()
		} else {
			abi::encode_call(
				&tx_options.abi,
				&tx_options.method_name,
				&tx_options.parameters,
			)?
		};

		let (hash, raw) = opts.sign(tx_options.contract_address, data).await?;
		let raw = &raw;

		let sent = params
			.with_retry(|client| async move {
				match client.send_raw_transaction(raw).await {
					Err(e) if is_already_known(&e) => {
						debug!(%hash, "Transaction already known to the node");
						Ok(hash)
					}
					other => other,
				}
			})
			.await?;

		info!(hash = %sent, nonce = opts.nonce, "Transaction sent");
		Ok(sent)
	}

	/// Polls for the receipt of `hash` at most `polls` times
	///
	/// # Errors
	/// Returns `TransactionError::ConfirmationTimeout` when no receipt shows up
	pub async fn wait_for_confirmation<T: BlockchainTransport>(
		params: &RpcParameters<T>,
		hash: B256,
		polls: u32,
		interval: Duration,
	) -> Result<EvmReceipt, TransactionError> {
		for poll in 1..=polls {
			if let Some(receipt) = params.receipt_with_retry(hash).await? {
				info!(%hash, success = receipt.is_success(), "Transaction mined");
				return Ok(receipt);
			}
			if poll < polls {
				tokio::time::sleep(interval).await;
			}
		}
		Err(TransactionError::ConfirmationTimeout { hash, polls })
	}
}
