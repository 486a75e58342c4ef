//! Per-workflow RPC handle.
//!
//! [`RpcParameters`] bundles the endpoint-backed client with the per-attempt timeout
//! and the retry policy. Every network call of a workflow goes through it: each
//! attempt asks the pool for the best endpoint first, so a rotation triggered by one
//! attempt is picked up by the next.

use std::{future::Future, sync::Arc, time::Duration};

use alloy::primitives::{Address, Bytes, B256, U256};
use tracing::{debug, warn};

use crate::{
	models::{CallRequest, EvmBlockHeader, EvmLog, EvmReceipt, LogFilter, Network},
	services::blockchain::{
		clients::{EvmClient, EvmClientTrait},
		transports::{BlockchainTransport, HttpTransportClient},
		BlockChainError,
	},
	utils::{RetryConfig, WithRetry},
};

/// Client handle, per-attempt timeout and retry policy of one workflow invocation
pub struct RpcParameters<T> {
	client: EvmClient<T>,
	timeout: Duration,
	retry: RetryConfig,
}

impl<T> Clone for RpcParameters<T> {
	fn clone(&self) -> Self {
		Self {
			client: self.client.clone(),
			timeout: self.timeout,
			retry: self.retry.clone(),
		}
	}
}

impl RpcParameters<HttpTransportClient> {
	/// Builds the handle for a configured network
	///
	/// No endpoint is contacted until the first call.
	pub fn from_network(network: &Network) -> Result<Self, BlockChainError> {
		Ok(Self::new(
			Arc::new(HttpTransportClient::new(network)?),
			network.rpc_timeout(),
			network.retry.clone(),
		))
	}
}

impl<T: BlockchainTransport> RpcParameters<T> {
	pub fn new(transport: Arc<T>, timeout: Duration, retry: RetryConfig) -> Self {
		Self {
			client: EvmClient::new_with_transport(transport),
			timeout,
			retry,
		}
	}

	/// Same handle with a different per-attempt deadline
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Same handle with a different retry policy
	pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
		self.retry = retry;
		self
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	pub fn retry_config(&self) -> &RetryConfig {
		&self.retry
	}

	/// Returns a client bound to a reachable endpoint
	///
	/// # Errors
	/// Returns `BlockChainError::NoHealthyEndpoint` when every endpoint is unreachable
	pub async fn get_best_rpc_client(&self) -> Result<EvmClient<T>, BlockChainError> {
		self.client.transport().ensure_connected().await?;
		Ok(self.client.clone())
	}

	/// Runs `operation` against the best endpoint under the retry policy
	///
	/// Each attempt fetches the best client again and is bounded by the handle's
	/// timeout. An attempt running into the timeout reports the endpoint it started on
	/// as failed, so the next attempt goes elsewhere. Fatal errors end the loop at once;
	/// the error of the last attempt is returned unchanged.
	pub async fn with_retry<F, Fut, R>(&self, operation: F) -> Result<R, BlockChainError>
	where
		F: Fn(EvmClient<T>) -> Fut,
		Fut: Future<Output = Result<R, BlockChainError>>,
	{
		let operation = &operation;
		WithRetry::new(self.retry.clone())
			.attempt_if(
				move || async move {
					let client = self.get_best_rpc_client().await?;
					let url = client.transport().get_current_url().await;
					match tokio::time::timeout(self.timeout, operation(client)).await {
						Ok(result) => result,
						Err(_) => {
							warn!(url = %url, timeout = ?self.timeout, "Attempt timed out");
							if let Err(e) = self.client.transport().report_failure(&url).await {
								debug!(url = %url, error = %e, "Rotation after timeout failed");
							}
							Err(BlockChainError::Timeout(self.timeout))
						}
					}
				},
				BlockChainError::is_retryable,
			)
			.await
	}

	pub async fn chain_id_with_retry(&self) -> Result<u64, BlockChainError> {
		self.with_retry(|client| async move { client.chain_id().await })
			.await
	}

	pub async fn block_number_with_retry(&self) -> Result<u64, BlockChainError> {
		self.with_retry(|client| async move { client.block_number().await })
			.await
	}

	pub async fn latest_block_with_retry(&self) -> Result<EvmBlockHeader, BlockChainError> {
		self.with_retry(|client| async move { client.get_latest_block().await })
			.await
	}

	pub async fn balance_with_retry(&self, address: Address) -> Result<U256, BlockChainError> {
		self.with_retry(|client| async move { client.get_balance(address).await })
			.await
	}

	/// Fetches the `pending` nonce of `address`
	///
	/// Every call asks the node again; the value is never cached.
	pub async fn pending_nonce_with_retry(&self, address: Address) -> Result<u64, BlockChainError> {
		self.with_retry(|client| async move { client.get_nonce(address).await })
			.await
	}

	pub async fn suggest_gas_price_with_retry(&self) -> Result<U256, BlockChainError> {
		self.with_retry(|client| async move { client.gas_price().await })
			.await
	}

	pub async fn estimate_gas_with_retry(
		&self,
		request: &CallRequest,
	) -> Result<u64, BlockChainError> {
		self.with_retry(|client| async move { client.estimate_gas(request).await })
			.await
	}

	pub async fn call_with_retry(&self, request: &CallRequest) -> Result<Bytes, BlockChainError> {
		self.with_retry(|client| async move { client.call(request).await })
			.await
	}

	pub async fn logs_with_retry(&self, filter: &LogFilter) -> Result<Vec<EvmLog>, BlockChainError> {
		self.with_retry(|client| async move { client.get_logs(filter).await })
			.await
	}

	pub async fn receipt_with_retry(
		&self,
		transaction_hash: B256,
	) -> Result<Option<EvmReceipt>, BlockChainError> {
		self.with_retry(|client| async move { client.get_transaction_receipt(transaction_hash).await })
			.await
	}
}
