//! JSON-RPC batch element.

use alloy::primitives::{Address, Bytes};
use serde_json::{json, Value};

use crate::utils::constants::LATEST_BLOCK_TAG;

/// One call inside a JSON-RPC batch
///
/// `result` and `error` start empty, are filled once the batch has been sent and
/// are read once when the results are unpacked.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchElem {
	pub method: String,
	pub args: Vec<Value>,
	pub result: Option<Value>,
	pub error: Option<String>,
}

impl BatchElem {
	/// An `eth_call` of `data` against `to` at the latest block
	pub fn eth_call(to: Address, data: Bytes) -> Self {
		Self {
			method: "eth_call".to_string(),
			args: vec![
				json!({
					"to": to,
					"data": data,
				}),
				json!(LATEST_BLOCK_TAG),
			],
			result: None,
			error: None,
		}
	}

	/// JSON-RPC 2.0 request object for this element
	pub fn to_request(&self, id: u64) -> Value {
		json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": self.method,
			"params": self.args,
		})
	}
}
