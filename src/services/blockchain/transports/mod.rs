//! Network transport implementations for blockchain clients.
//!
//! - [`EndpointManager`]: the shared pool of RPC endpoints with lazy health checks
//! - [`HttpTransportClient`]: JSON-RPC over HTTP on top of the pool

mod endpoint_manager;
mod http;

pub use endpoint_manager::{Endpoint, EndpointManager};
pub use http::HttpTransportClient;

use serde::Serialize;
use serde_json::{json, Value};

use crate::services::blockchain::BlockChainError;

/// Base trait for all blockchain transport clients
#[async_trait::async_trait]
pub trait BlockchainTransport: Send + Sync {
	/// Get the current URL being used by the transport
	async fn get_current_url(&self) -> String;

	/// Send a raw request to the blockchain
	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, BlockChainError>
	where
		P: Into<Value> + Send + Clone + Serialize;

	/// Send a JSON-RPC batch and return the raw response array
	///
	/// Responses may come back in any order; callers match them by `id`.
	async fn send_batch_request(&self, requests: Vec<Value>) -> Result<Vec<Value>, BlockChainError>;

	/// Customizes the request for specific blockchain requirements
	async fn customize_request<P>(&self, method: &str, params: Option<P>) -> Value
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": method,
			"params": params.map(|p| p.into())
		})
	}

	/// Makes sure the transport points at a reachable endpoint
	///
	/// Transports without an endpoint pool are always considered connected.
	async fn ensure_connected(&self) -> Result<(), BlockChainError> {
		Ok(())
	}

	/// Reports that a request sent to `url` got no answer in time
	///
	/// Pooled transports rotate away from `url` unless another task already did.
	/// Transports without an endpoint pool ignore the report.
	async fn report_failure(&self, _url: &str) -> Result<(), BlockChainError> {
		Ok(())
	}
}

/// Extension trait for transports that support URL rotation
#[async_trait::async_trait]
pub trait RotatingTransport: BlockchainTransport {
	/// Attempts to establish a connection with a new URL
	async fn try_connect(&self, url: &str) -> Result<(), BlockChainError>;

	/// Updates the client with a new URL
	async fn update_client(&self, url: &str) -> Result<(), BlockChainError>;
}
