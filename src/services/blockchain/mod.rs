//! Blockchain RPC access.
//!
//! Provides the layers every workflow goes through to reach the chain:
//!
//! - Network transport over a pool of RPC endpoints
//! - The EVM client and its per-workflow handle with retry and timeout
//! - Generic invocation of named contract operations
//! - Batched contract reads
//! - Error handling for blockchain operations

pub mod abi;
pub mod batch;
mod clients;
mod error;
mod invoker;
mod parameters;
mod transports;

pub use batch::{
	batch_call, create_batch_calls, perform_batch_call, process_batch_results, resolve_batch_function,
};
pub use clients::{EvmClient, EvmClientTrait};
pub use error::BlockChainError;
pub use invoker::{ContractBinding, Invoker, MethodFuture, MethodRegistry};
pub use parameters::RpcParameters;
pub use transports::{
	BlockchainTransport, Endpoint, EndpointManager, HttpTransportClient, RotatingTransport,
};
