use std::{path::PathBuf, sync::Arc};

use alloy::{
	dyn_abi::DynSolValue,
	json_abi::JsonAbi,
	primitives::{Address, U256},
};
use zeroize::Zeroizing;

use crate::models::GasConfig;

/// Everything a workflow supplies to submit one contract transaction
///
/// Consumed once by the transaction builder to produce a signed handle. An empty
/// `method_name` describes a plain value transfer to `contract_address`.
#[derive(Clone)]
pub struct TransactionOptions {
	/// Sending account
	pub account: Address,
	/// Password unlocking the account keystore
	pub password: Zeroizing<String>,
	/// Directory holding the encrypted keystore files
	pub keystore_path: PathBuf,
	/// Target contract
	pub contract_address: Address,
	/// ABI of the target contract
	pub abi: Arc<JsonAbi>,
	/// Contract method to call
	pub method_name: String,
	/// Positional ABI arguments of the call
	pub parameters: Vec<DynSolValue>,
	/// Chain the transaction is bound to
	pub chain_id: u64,
	/// Gas settings for this network
	pub gas: GasConfig,
	/// Ether to transfer with the call, in wei
	pub value: Option<U256>,
}

impl TransactionOptions {
	/// Whether the options describe a plain transfer without call data
	pub fn is_transfer(&self) -> bool {
		self.method_name.is_empty()
	}
}

impl std::fmt::Debug for TransactionOptions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TransactionOptions")
			.field("account", &self.account)
			.field("password", &"<redacted>")
			.field("keystore_path", &self.keystore_path)
			.field("contract_address", &self.contract_address)
			.field("method_name", &self.method_name)
			.field("parameters", &self.parameters)
			.field("chain_id", &self.chain_id)
			.field("gas", &self.gas)
			.field("value", &self.value)
			.finish()
	}
}
