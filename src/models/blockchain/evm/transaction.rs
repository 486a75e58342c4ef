//! EVM call, receipt and log data structures.

use alloy::primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// Call object shared by `eth_call` and `eth_estimateGas`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from: Option<Address>,
	pub to: Address,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gas_price: Option<U256>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<U256>,
	pub data: Bytes,
}

impl CallRequest {
	/// A read-only call of `data` against `to`
	pub fn new(to: Address, data: Bytes) -> Self {
		Self {
			to,
			data,
			..Default::default()
		}
	}
}

/// Transaction receipt fields needed to confirm a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmReceipt {
	pub transaction_hash: B256,
	#[serde(default)]
	pub block_number: Option<U64>,
	#[serde(default)]
	pub gas_used: Option<U64>,
	#[serde(default)]
	pub status: Option<U64>,
}

impl EvmReceipt {
	/// Whether the transaction executed without reverting
	pub fn is_success(&self) -> bool {
		self.status.is_some_and(|status| status == U64::from(1))
	}
}

/// A contract event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmLog {
	pub address: Address,
	pub topics: Vec<B256>,
	pub data: Bytes,
	#[serde(default)]
	pub block_number: Option<U64>,
	#[serde(default)]
	pub transaction_hash: Option<B256>,
	#[serde(default)]
	pub log_index: Option<U64>,
}

/// Filter object for `eth_getLogs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
	pub from_block: U64,
	pub to_block: U64,
	#[serde(skip_serializing_if = "Vec::is_empty", default)]
	pub address: Vec<Address>,
	#[serde(skip_serializing_if = "Vec::is_empty", default)]
	pub topics: Vec<Option<B256>>,
}

impl LogFilter {
	/// Logs of `address` emitted between `from_block` and `to_block`, inclusive
	pub fn for_contract(address: Address, from_block: u64, to_block: u64) -> Self {
		Self {
			from_block: U64::from(from_block),
			to_block: U64::from(to_block),
			address: vec![address],
			topics: Vec::new(),
		}
	}
}
