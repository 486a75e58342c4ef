//! HTTP transport implementation for blockchain interactions.
//!
//! This module provides a JSON-RPC over HTTP client supporting:
//! - Multiple RPC endpoints with automatic failover
//! - Lazy connection health checks
//! - Batched requests

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::{
	models::Network,
	services::blockchain::{
		transports::{BlockchainTransport, EndpointManager, RotatingTransport},
		BlockChainError,
	},
	utils::{
		constants::HEALTH_CHECK_PAYLOAD,
		http::{create_base_http_client, create_retryable_http_client, HttpRetryConfig},
	},
};

/// HTTP transport client for EVM JSON-RPC nodes
///
/// The client is thread-safe and cheap to clone; clones share the endpoint pool.
#[derive(Clone, Debug)]
pub struct HttpTransportClient {
	/// Plain HTTP client used for connectivity checks
	client: reqwest::Client,
	/// Manages RPC endpoint rotation and request handling for high availability
	endpoint_manager: EndpointManager,
}

impl HttpTransportClient {
	/// Creates a new HTTP transport client for a network
	///
	/// No request is sent here: endpoints are tested the first time a caller asks for
	/// a connected client.
	///
	/// # Arguments
	/// * `network` - Network configuration containing RPC URLs, weights, and timeout
	///
	/// # Errors
	/// Returns `BlockChainError::ConfigError` if the network has no usable endpoint or
	/// one of its URLs is malformed
	pub fn new(network: &Network) -> Result<Self, BlockChainError> {
		let rpc_urls = network.weighted_rpc_urls();
		if rpc_urls.is_empty() {
			return Err(BlockChainError::ConfigError(format!(
				"Network {} has no usable RPC endpoints",
				network.slug
			)));
		}

		let endpoints = rpc_urls
			.iter()
			.map(|rpc_url| {
				normalize_url(&rpc_url.url).map(|url| (url, rpc_url.weight))
			})
			.collect::<Result<Vec<_>, _>>()?;

		let client = create_base_http_client(network.rpc_timeout()).map_err(|e| {
			BlockChainError::ConfigError(format!("Failed to create HTTP client: {}", e))
		})?;
		let retryable_client =
			create_retryable_http_client(&HttpRetryConfig::default(), client.clone());

		Ok(Self {
			client,
			endpoint_manager: EndpointManager::new(retryable_client, endpoints)?,
		})
	}

	/// The endpoint pool backing this transport
	pub fn endpoint_manager(&self) -> &EndpointManager {
		&self.endpoint_manager
	}
}

/// Parses `url` and trims a trailing slash
fn normalize_url(url: &str) -> Result<String, BlockChainError> {
	let parsed_url = Url::parse(url)
		.map_err(|e| BlockChainError::ConfigError(format!("Invalid URL {}: {}", url, e)))?;
	Ok(parsed_url.as_str().trim_end_matches('/').to_string())
}

#[async_trait]
impl BlockchainTransport for HttpTransportClient {
	async fn get_current_url(&self) -> String {
		self.endpoint_manager.active_url().await
	}

	async fn send_raw_request<P>(
		&self,
		method: &str,
		params: Option<P>,
	) -> Result<Value, BlockChainError>
	where
		P: Into<Value> + Send + Clone + Serialize,
	{
		self.endpoint_manager
			.send_raw_request(self, method, params)
			.await
	}

	async fn send_batch_request(&self, requests: Vec<Value>) -> Result<Vec<Value>, BlockChainError> {
		self.endpoint_manager
			.send_batch_request(self, requests)
			.await
	}

	async fn ensure_connected(&self) -> Result<(), BlockChainError> {
		self.endpoint_manager.ensure_connected(self).await
	}

	async fn report_failure(&self, url: &str) -> Result<(), BlockChainError> {
		self.endpoint_manager.rotate_url(self, url).await
	}
}

#[async_trait]
impl RotatingTransport for HttpTransportClient {
	/// Tests connectivity to a specific RPC endpoint
	///
	/// Sends an `eth_chainId` request and requires a successful HTTP status.
	async fn try_connect(&self, url: &str) -> Result<(), BlockChainError> {
		let url = Url::parse(url).map_err(|_| {
			BlockChainError::ConfigError(format!("Invalid URL: {}", url))
		})?;

		let response = self
			.client
			.post(url.clone())
			.header(reqwest::header::CONTENT_TYPE, "application/json")
			.body(HEALTH_CHECK_PAYLOAD)
			.send()
			.await
			.map_err(|e| {
				BlockChainError::connection_error(format!("Failed to connect to {}: {}", url, e))
			})?;

		response.error_for_status().map(|_| ()).map_err(|e| {
			BlockChainError::connection_error(format!("Health check failed for {}: {}", url, e))
		})
	}

	/// Validates the URL of the endpoint the pool switched to
	///
	/// Requests always go to the pool's active URL, so the HTTP client itself
	/// needs no update.
	async fn update_client(&self, url: &str) -> Result<(), BlockChainError> {
		normalize_url(url).map(|_| ())
	}
}
