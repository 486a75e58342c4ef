//! EVM-compatible blockchain client implementation.
//!
//! This module provides functionality to interact with Ethereum and other EVM-compatible
//! blockchains over JSON-RPC: chain state queries, calls, gas estimation, raw
//! transaction submission and batched `eth_call`s.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::{
	models::{BatchElem, CallRequest, EvmBlockHeader, EvmLog, EvmReceipt, LogFilter, Network},
	services::blockchain::{
		transports::{BlockchainTransport, HttpTransportClient},
		BlockChainError,
	},
	utils::constants::{LATEST_BLOCK_TAG, PENDING_BLOCK_TAG},
};

/// Client implementation for Ethereum Virtual Machine (EVM) compatible blockchains
///
/// Cloning is cheap: clones share the same transport and therefore the same
/// endpoint pool.
pub struct EvmClient<T> {
	/// The underlying transport client for RPC communication
	transport: Arc<T>,
}

impl<T> Clone for EvmClient<T> {
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
		}
	}
}

impl<T> EvmClient<T> {
	/// Creates a new EVM client instance with a specific transport client
	pub fn new_with_transport(transport: Arc<T>) -> Self {
		Self { transport }
	}

	/// The transport requests are sent through
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}
}

impl EvmClient<HttpTransportClient> {
	/// Creates a new EVM client instance for a network
	///
	/// # Arguments
	/// * `network` - Network configuration containing RPC endpoints and chain details
	pub fn new(network: &Network) -> Result<Self, BlockChainError> {
		let transport = HttpTransportClient::new(network)?;
		Ok(Self::new_with_transport(Arc::new(transport)))
	}
}

impl<T: BlockchainTransport> EvmClient<T> {
	/// Sends a request and deserializes its `result`
	async fn request<R: DeserializeOwned>(
		&self,
		method: &str,
		params: Value,
	) -> Result<R, BlockChainError> {
		let response = self.transport.send_raw_request(method, Some(params)).await?;
		let result = extract_result(response)?;

		serde_json::from_value(result).map_err(|e| {
			BlockChainError::request_error(format!("Failed to parse {} result: {}", method, e))
		})
	}
}

/// Extracts the `result` of a JSON-RPC response, turning an `error` object into
/// `BlockChainError::RpcError`
pub(crate) fn extract_result(mut response: Value) -> Result<Value, BlockChainError> {
	if let Some(error) = response.get("error").filter(|error| !error.is_null()) {
		return Err(rpc_error(error));
	}

	response
		.get_mut("result")
		.map(Value::take)
		.ok_or_else(|| BlockChainError::request_error("Missing 'result' field"))
}

/// Converts a JSON-RPC error object, keeping revert data in the message
pub(crate) fn rpc_error(error: &Value) -> BlockChainError {
	let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
	let mut message = error
		.get("message")
		.and_then(Value::as_str)
		.unwrap_or("unknown error")
		.to_string();
	if let Some(data) = error.get("data").and_then(Value::as_str) {
		message = format!("{} ({})", message, data);
	}
	BlockChainError::RpcError { code, message }
}

/// Chain state queries and transaction submission for EVM-compatible blockchains
#[async_trait]
pub trait EvmClientTrait: Send + Sync {
	/// Chain id reported by the node
	async fn chain_id(&self) -> Result<u64, BlockChainError>;

	/// Number of the most recent block
	async fn block_number(&self) -> Result<u64, BlockChainError>;

	/// Header of the most recent block
	async fn get_latest_block(&self) -> Result<EvmBlockHeader, BlockChainError>;

	/// Balance of `address` in wei at the latest block
	async fn get_balance(&self, address: Address) -> Result<U256, BlockChainError>;

	/// Next usable nonce of `address`, pending transactions included
	async fn get_nonce(&self, address: Address) -> Result<u64, BlockChainError>;

	/// Gas price suggested by the node, in wei
	async fn gas_price(&self) -> Result<U256, BlockChainError>;

	/// Simulates `request` and returns the gas it would consume
	async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, BlockChainError>;

	/// Executes a read-only call at the latest block and returns the raw return data
	async fn call(&self, request: &CallRequest) -> Result<Bytes, BlockChainError>;

	/// Retrieves the logs matching `filter`
	async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<EvmLog>, BlockChainError>;

	/// Broadcasts a signed, EIP-2718 encoded transaction
	async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, BlockChainError>;

	/// Receipt of a mined transaction, `None` while it is still pending
	async fn get_transaction_receipt(
		&self,
		transaction_hash: B256,
	) -> Result<Option<EvmReceipt>, BlockChainError>;

	/// Sends every element as one JSON-RPC batch and fills in its result or error
	///
	/// Elements keep their input order. An element the node did not answer gets an
	/// error.
	async fn send_batch(&self, calls: Vec<BatchElem>) -> Result<Vec<BatchElem>, BlockChainError>;
}

#[async_trait]
impl<T: BlockchainTransport> EvmClientTrait for EvmClient<T> {
	async fn chain_id(&self) -> Result<u64, BlockChainError> {
		let chain_id: U64 = self.request("eth_chainId", json!([])).await?;
		Ok(chain_id.to::<u64>())
	}

	async fn block_number(&self) -> Result<u64, BlockChainError> {
		let number: U64 = self.request("eth_blockNumber", json!([])).await?;
		Ok(number.to::<u64>())
	}

	async fn get_latest_block(&self) -> Result<EvmBlockHeader, BlockChainError> {
		let block: Option<EvmBlockHeader> = self
			.request("eth_getBlockByNumber", json!([LATEST_BLOCK_TAG, false]))
			.await?;
		block.ok_or_else(|| BlockChainError::BlockNotFound(LATEST_BLOCK_TAG.to_string()))
	}

	async fn get_balance(&self, address: Address) -> Result<U256, BlockChainError> {
		self.request("eth_getBalance", json!([address, LATEST_BLOCK_TAG]))
			.await
	}

	async fn get_nonce(&self, address: Address) -> Result<u64, BlockChainError> {
		let nonce: U64 = self
			.request(
				"eth_getTransactionCount",
				json!([address, PENDING_BLOCK_TAG]),
			)
			.await?;
		Ok(nonce.to::<u64>())
	}

	async fn gas_price(&self) -> Result<U256, BlockChainError> {
		self.request("eth_gasPrice", json!([])).await
	}

	async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, BlockChainError> {
		let gas: U64 = self.request("eth_estimateGas", json!([request])).await?;
		Ok(gas.to::<u64>())
	}

	async fn call(&self, request: &CallRequest) -> Result<Bytes, BlockChainError> {
		self.request("eth_call", json!([request, LATEST_BLOCK_TAG]))
			.await
	}

	async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<EvmLog>, BlockChainError> {
		self.request("eth_getLogs", json!([filter])).await
	}

	async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, BlockChainError> {
		self.request("eth_sendRawTransaction", json!([raw])).await
	}

	async fn get_transaction_receipt(
		&self,
		transaction_hash: B256,
	) -> Result<Option<EvmReceipt>, BlockChainError> {
		self.request("eth_getTransactionReceipt", json!([transaction_hash]))
			.await
	}

	async fn send_batch(
		&self,
		mut calls: Vec<BatchElem>,
	) -> Result<Vec<BatchElem>, BlockChainError> {
		let requests = calls
			.iter()
			.enumerate()
			.map(|(id, call)| call.to_request(id as u64))
			.collect();

		let responses = self.transport.send_batch_request(requests).await?;

		let mut answered = vec![false; calls.len()];
		for mut response in responses {
			let id = response
				.get("id")
				.and_then(Value::as_u64)
				.map(|id| id as usize)
				.filter(|&id| id < calls.len())
				.ok_or_else(|| {
					BlockChainError::request_error("Batch response with unknown id")
				})?;

			let error = response
				.get("error")
				.filter(|error| !error.is_null())
				.map(rpc_error);
			let call = &mut calls[id];
			match error {
				Some(error) => call.error = Some(error.to_string()),
				None => call.result = response.get_mut("result").map(Value::take),
			}
			answered[id] = true;
		}

		for (call, answered) in calls.iter_mut().zip(answered) {
			if !answered {
				call.error = Some("no response for batch element".to_string());
			}
		}

		Ok(calls)
	}
}
