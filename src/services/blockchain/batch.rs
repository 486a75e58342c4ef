//! Batched contract reads.
//!
//! N calls of one contract method are packed into a single JSON-RPC batch of
//! `eth_call`s, sent through the best endpoint and unpacked in input order. The
//! batch is all-or-nothing: one failed element fails the whole batch and no partial
//! result is ever returned.

use alloy::{
	dyn_abi::DynSolValue,
	json_abi::{Function, JsonAbi},
	primitives::Address,
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
	models::BatchElem,
	services::blockchain::{
		abi,
		clients::EvmClientTrait,
		transports::BlockchainTransport,
		BlockChainError, RpcParameters,
	},
};

/// Resolves the overload of `method` every call of a batch goes through
///
/// The arity of the first argument set picks the overload.
pub fn resolve_batch_function<'a>(
	abi: &'a JsonAbi,
	method: &str,
	arg_sets: &[Vec<DynSolValue>],
) -> Result<&'a Function, BlockChainError> {
	abi::find_function(abi, method, arg_sets.first().map(Vec::len))
}

/// Packs one `eth_call` of `function` per argument set
///
/// # Errors
/// Fails with `BlockChainError::EncodingError` as soon as one argument set cannot be
/// encoded; no element is produced in that case.
pub fn create_batch_calls(
	function: &Function,
	contract: Address,
	arg_sets: &[Vec<DynSolValue>],
) -> Result<Vec<BatchElem>, BlockChainError> {
	arg_sets
		.iter()
		.map(|args| {
			abi::encode_function_call(function, args)
				.map(|data| BatchElem::eth_call(contract, data))
		})
		.collect()
}

/// Sends every call as one batch under the retry policy of `params`
///
/// A retry resends the entire batch. An element still carrying an error after the
/// batch came back fails the attempt with a retryable `BlockChainError::BatchCallError`.
pub async fn perform_batch_call<T: BlockchainTransport>(
	params: &RpcParameters<T>,
	calls: Vec<BatchElem>,
) -> Result<Vec<BatchElem>, BlockChainError> {
	if calls.is_empty() {
		return Ok(calls);
	}

	let calls = &calls;
	params
		.with_retry(|client| async move {
			let calls = client.send_batch(calls.clone()).await?;
			if let Some((index, error)) = calls
				.iter()
				.enumerate()
				.find_map(|(index, call)| call.error.as_ref().map(|error| (index, error)))
			{
				return Err(BlockChainError::BatchCallError(format!(
					"element {}: {}",
					index, error
				)));
			}
			Ok(calls)
		})
		.await
}

/// Decodes the result of every call in input order
///
/// Fails the whole batch when an element carries an error, has no result, has a
/// non-string result, has a payload of zero bytes or cannot be decoded.
pub fn process_batch_results(
	function: &Function,
	calls: &[BatchElem],
) -> Result<Vec<Vec<DynSolValue>>, BlockChainError> {
	calls
		.iter()
		.enumerate()
		.map(|(index, call)| {
			if let Some(error) = &call.error {
				return Err(BlockChainError::BatchCallError(format!(
					"element {}: {}",
					index, error
				)));
			}

			let payload = match &call.result {
				None | Some(Value::Null) => return Err(BlockChainError::EmptyBatchResult),
				Some(Value::String(payload)) => payload,
				Some(other) => {
					return Err(BlockChainError::DecodeError(format!(
						"element {}: result is not a string: {}",
						index, other
					)))
				}
			};
			if payload.is_empty() {
				return Err(BlockChainError::EmptyBatchResult);
			}

			let bytes = hex::decode(payload.trim_start_matches("0x")).map_err(|e| {
				BlockChainError::DecodeError(format!("element {}: {}", index, e))
			})?;
			if bytes.is_empty() {
				return Err(BlockChainError::DecodeError(format!(
					"element {}: result decodes to zero bytes",
					index
				)));
			}

			abi::decode_function_output(function, &bytes)
		})
		.collect()
}

/// Reads `method` of `contract` once per argument set in a single batch
///
/// Results are returned in the order of `arg_sets`.
#[instrument(skip(params, abi, arg_sets), fields(calls = arg_sets.len()))]
pub async fn batch_call<T: BlockchainTransport>(
	params: &RpcParameters<T>,
	abi: &JsonAbi,
	contract: Address,
	method: &str,
	arg_sets: &[Vec<DynSolValue>],
) -> Result<Vec<Vec<DynSolValue>>, BlockChainError> {
	let function = resolve_batch_function(abi, method, arg_sets)?;
	let calls = create_batch_calls(function, contract, arg_sets)?;
	let calls = perform_batch_call(params, calls).await?;
	let results = process_batch_results(function, &calls)?;
	debug!(method, results = results.len(), "Batch call completed");
	Ok(results)
}
