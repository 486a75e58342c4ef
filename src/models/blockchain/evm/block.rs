//! EVM block data structures.

use alloy::primitives::{B256, U64};
use serde::{Deserialize, Serialize};

/// The subset of an `eth_getBlockByNumber` response the staker relies on
///
/// Transactions and the remaining header fields are ignored while deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmBlockHeader {
	pub number: U64,
	#[serde(default)]
	pub hash: Option<B256>,
	pub gas_limit: U64,
	pub timestamp: U64,
}

impl EvmBlockHeader {
	/// Block number
	pub fn number(&self) -> u64 {
		self.number.to::<u64>()
	}

	/// Maximum gas all transactions of the block may consume
	pub fn gas_limit(&self) -> u64 {
		self.gas_limit.to::<u64>()
	}

	/// Block timestamp in seconds
	pub fn timestamp(&self) -> u64 {
		self.timestamp.to::<u64>()
	}
}
