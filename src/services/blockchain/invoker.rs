//! Generic invocation of named contract operations.
//!
//! A [`MethodRegistry`] maps operation names to closures taking a live client and the
//! positional ABI arguments. [`Invoker::invoke_with_retry`] resolves a name, injects
//! the best client of the pool and runs the operation under the retry policy.
//! [`ContractBinding::registry`] fills a registry with every function of a JSON ABI,
//! and custom operations can be registered next to them.

use std::{collections::HashMap, fmt, future::Future, sync::Arc};

use alloy::{
	dyn_abi::DynSolValue,
	json_abi::JsonAbi,
	primitives::{Address, Bytes},
};
use futures::future::BoxFuture;
use tracing::instrument;

use crate::{
	models::CallRequest,
	services::blockchain::{
		abi,
		clients::{EvmClient, EvmClientTrait},
		transports::BlockchainTransport,
		BlockChainError, RpcParameters,
	},
};

/// Future returned by a registered operation
pub type MethodFuture = BoxFuture<'static, Result<Vec<DynSolValue>, BlockChainError>>;

type MethodFn<C> = Arc<dyn Fn(C, Vec<DynSolValue>) -> MethodFuture + Send + Sync>;

/// Named operations bound to a client of type `C`
pub struct MethodRegistry<C> {
	methods: HashMap<String, MethodFn<C>>,
}

impl<C> Default for MethodRegistry<C> {
	fn default() -> Self {
		Self {
			methods: HashMap::new(),
		}
	}
}

impl<C> Clone for MethodRegistry<C> {
	fn clone(&self) -> Self {
		Self {
			methods: self.methods.clone(),
		}
	}
}

impl<C> fmt::Debug for MethodRegistry<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut names: Vec<_> = self.methods.keys().collect();
		names.sort();
		f.debug_struct("MethodRegistry")
			.field("methods", &names)
			.finish()
	}
}

impl<C> MethodRegistry<C> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `method` under `name`, replacing any previous operation of that name
	pub fn register<F, Fut>(&mut self, name: impl Into<String>, method: F)
	where
		F: Fn(C, Vec<DynSolValue>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Vec<DynSolValue>, BlockChainError>> + Send + 'static,
	{
		self.methods.insert(
			name.into(),
			Arc::new(move |client, args| Box::pin(method(client, args))),
		);
	}

	/// Builder form of [`MethodRegistry::register`]
	pub fn with_method<F, Fut>(mut self, name: impl Into<String>, method: F) -> Self
	where
		F: Fn(C, Vec<DynSolValue>) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Vec<DynSolValue>, BlockChainError>> + Send + 'static,
	{
		self.register(name, method);
		self
	}

	pub fn contains(&self, name: &str) -> bool {
		self.methods.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.methods.len()
	}

	pub fn is_empty(&self) -> bool {
		self.methods.is_empty()
	}

	/// Resolves `name` and runs the operation with `client`
	///
	/// # Errors
	/// Returns `BlockChainError::MethodNotFound` for an unregistered name
	pub async fn invoke(
		&self,
		client: C,
		name: &str,
		args: Vec<DynSolValue>,
	) -> Result<Vec<DynSolValue>, BlockChainError> {
		let method = self
			.methods
			.get(name)
			.ok_or_else(|| BlockChainError::MethodNotFound(name.to_string()))?;
		method(client, args).await
	}
}

/// Runs registered operations against the endpoint pool
pub struct Invoker;

impl Invoker {
	/// Invokes `method` with `args` under the retry policy of `params`
	///
	/// Each attempt resolves the method again and receives the current best client.
	/// An unknown method fails at once; network and RPC errors are retried and the last
	/// one is returned unchanged.
	#[instrument(skip(params, registry, args))]
	pub async fn invoke_with_retry<T>(
		params: &RpcParameters<T>,
		registry: &MethodRegistry<EvmClient<T>>,
		method: &str,
		args: Vec<DynSolValue>,
	) -> Result<Vec<DynSolValue>, BlockChainError>
	where
		T: BlockchainTransport,
	{
		let args = &args;
		params
			.with_retry(|client| async move { registry.invoke(client, method, args.clone()).await })
			.await
	}
}

/// A deployed contract: its address and JSON ABI
#[derive(Debug, Clone)]
pub struct ContractBinding {
	name: String,
	address: Address,
	abi: Arc<JsonAbi>,
}

impl ContractBinding {
	pub fn new(name: impl Into<String>, address: Address, abi: Arc<JsonAbi>) -> Self {
		Self {
			name: name.into(),
			address,
			abi,
		}
	}

	/// Builds a binding from the JSON text of an ABI
	///
	/// # Errors
	/// Returns `BlockChainError::ConfigError` if the ABI cannot be parsed
	pub fn from_json(
		name: impl Into<String>,
		address: Address,
		abi_json: &str,
	) -> Result<Self, BlockChainError> {
		let name = name.into();
		let abi: JsonAbi = serde_json::from_str(abi_json).map_err(|e| {
			BlockChainError::ConfigError(format!("Invalid ABI for {}: {}", name, e))
		})?;
		Ok(Self::new(name, address, Arc::new(abi)))
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn abi(&self) -> &Arc<JsonAbi> {
		&self.abi
	}

	/// ABI-encoded call data of `method`
	pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> Result<Bytes, BlockChainError> {
		abi::encode_call(&self.abi, method, args)
	}

	/// Decodes the return data of `method`
	pub fn decode_output(&self, method: &str, data: &[u8]) -> Result<Vec<DynSolValue>, BlockChainError> {
		abi::decode_output(&self.abi, method, data)
	}

	/// Calls `method` once through `client` at the latest block
	pub async fn call<C: EvmClientTrait>(
		&self,
		client: &C,
		method: &str,
		args: &[DynSolValue],
	) -> Result<Vec<DynSolValue>, BlockChainError> {
		let function = abi::find_function(&self.abi, method, Some(args.len()))?;
		let data = abi::encode_function_call(function, args)?;
		let output = client.call(&CallRequest::new(self.address, data)).await?;
		abi::decode_function_output(function, &output)
	}

	/// Calls `method` under the retry policy of `params`
	pub async fn call_with_retry<T: BlockchainTransport>(
		&self,
		params: &RpcParameters<T>,
		method: &str,
		args: &[DynSolValue],
	) -> Result<Vec<DynSolValue>, BlockChainError> {
		params
			.with_retry(|client| async move { self.call(&client, method, args).await })
			.await
	}

	/// Registry with one read operation per ABI function
	pub fn registry<T>(&self) -> MethodRegistry<EvmClient<T>>
	where
		T: BlockchainTransport + 'static,
	{
		let mut registry = MethodRegistry::new();
		for function in self.abi.functions() {
			if registry.contains(&function.name) {
				continue;
			}

			let binding = self.clone();
			let method = function.name.clone();
			registry.register(function.name.clone(), move |client: EvmClient<T>, args| {
				let binding = binding.clone();
				let method = method.clone();
				async move { binding.call(&client, &method, &args).await }
			});
		}
		registry
	}
}
