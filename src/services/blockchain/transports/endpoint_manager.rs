//! Manages the pool of blockchain HTTP RPC endpoints
//!
//! The pool prefers the endpoint that most recently answered. When that endpoint fails
//! the pool rotates to the next configured one, testing connectivity on demand. There
//! is no background heartbeat: an endpoint is only re-tested when a caller needs it.

use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use serde_json::Value;
use std::{
	sync::Arc,
	time::{Duration, Instant},
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::{
	services::blockchain::{transports::RotatingTransport, BlockChainError},
	utils::constants::ROTATE_ON_ERROR_CODES,
};

/// A configured RPC endpoint and what the pool last observed about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	pub url: String,
	pub weight: u32,
	/// Cleared when a request or a connectivity check against the endpoint fails
	pub healthy: bool,
	/// Round trip of the last successful connectivity check
	pub latency: Option<Duration>,
}

#[derive(Debug)]
struct PoolState {
	endpoints: Vec<Endpoint>,
	active: usize,
	/// Whether the active endpoint passed a connectivity check since it last failed
	verified: bool,
}

impl PoolState {
	fn active_url(&self) -> &str {
		&self.endpoints[self.active].url
	}
}

/// Shared pool of RPC endpoints
///
/// Clones share the same state, so a rotation performed by one task is seen by all
/// others. Rotations are serialized through `rotation_lock`.
///
/// # Fields
/// * `state` - Endpoints, the index of the active one and its verification flag
/// * `client` - The client used to send requests to the active endpoint
/// * `rotation_lock` - A lock for managing the rotation process
#[derive(Clone, Debug)]
pub struct EndpointManager {
	state: Arc<RwLock<PoolState>>,
	client: ClientWithMiddleware,
	rotation_lock: Arc<Mutex<()>>,
}

impl EndpointManager {
	/// Creates a new endpoint pool
	///
	/// # Arguments
	/// * `client` - The client to use for requests
	/// * `endpoints` - `(url, weight)` pairs in order of preference
	///
	/// # Errors
	/// Returns `BlockChainError::ConfigError` when no endpoint is given
	pub fn new(
		client: ClientWithMiddleware,
		endpoints: Vec<(String, u32)>,
	) -> Result<Self, BlockChainError> {
		if endpoints.is_empty() {
			return Err(BlockChainError::ConfigError(
				"No RPC endpoints configured".to_string(),
			));
		}

		let endpoints = endpoints
			.into_iter()
			.map(|(url, weight)| Endpoint {
				url,
				weight,
				healthy: true,
				latency: None,
			})
			.collect();

		Ok(Self {
			state: Arc::new(RwLock::new(PoolState {
				endpoints,
				active: 0,
				verified: false,
			})),
			client,
			rotation_lock: Arc::new(Mutex::new(())),
		})
	}

	/// Updates the client with a new client
	///
	/// Useful for updating the client with a new retry policy or strategy
	pub fn update_client(&mut self, client: ClientWithMiddleware) {
		self.client = client;
	}

	/// URL of the endpoint requests are currently sent to
	pub async fn active_url(&self) -> String {
		self.state.read().await.active_url().to_string()
	}

	/// Snapshot of every endpoint in order of preference
	pub async fn endpoints(&self) -> Vec<Endpoint> {
		self.state.read().await.endpoints.clone()
	}

	/// Makes sure the active endpoint passed a connectivity check
	///
	/// When it has not, the active endpoint is tested first and then every other
	/// endpoint in order of preference. The first reachable one becomes active.
	///
	/// # Errors
	/// Returns `BlockChainError::NoHealthyEndpoint` when every endpoint is unreachable
	pub async fn ensure_connected<T: RotatingTransport>(
		&self,
		transport: &T,
	) -> Result<(), BlockChainError> {
		if self.state.read().await.verified {
			return Ok(());
		}

		let _guard = self.rotation_lock.lock().await;

		let candidates = {
			let state = self.state.read().await;
			if state.verified {
				return Ok(());
			}
			let mut order: Vec<usize> = (0..state.endpoints.len()).collect();
			order.sort_by_key(|&idx| idx != state.active);
			order
		};

		match self.probe(transport, &candidates).await {
			Some(idx) => self.activate(transport, idx).await,
			None => Err(BlockChainError::NoHealthyEndpoint),
		}
	}

	/// Rotates away from `failed_url`
	///
	/// Does nothing when another task already rotated away from it. Otherwise the failed
	/// endpoint is marked unhealthy and the remaining endpoints are tested, healthy ones
	/// first, until one answers.
	///
	/// # Arguments
	/// * `transport` - The transport client implementing the RotatingTransport trait
	/// * `failed_url` - The URL the caller saw failing
	pub async fn rotate_url<T: RotatingTransport>(
		&self,
		transport: &T,
		failed_url: &str,
	) -> Result<(), BlockChainError> {
		let _guard = self.rotation_lock.lock().await;

		let candidates = {
			let mut state = self.state.write().await;
			if state.active_url() != failed_url {
				debug!(
					failed_url,
					active_url = state.active_url(),
					"Endpoint already rotated"
				);
				return Ok(());
			}

			let failed = state.active;
			state.endpoints[failed].healthy = false;
			state.verified = false;

			let mut order: Vec<usize> = (0..state.endpoints.len())
				.filter(|&idx| idx != failed)
				.collect();
			order.sort_by_key(|&idx| !state.endpoints[idx].healthy);
			order
		};

		match self.probe(transport, &candidates).await {
			Some(idx) => {
				self.activate(transport, idx).await?;
				let active_url = self.active_url().await;
				debug!(from = failed_url, to = %active_url, "Successful rotation");
				Ok(())
			}
			None => Err(BlockChainError::NoHealthyEndpoint),
		}
	}

	/// Tests the candidates in order and returns the first reachable one
	async fn probe<T: RotatingTransport>(&self, transport: &T, candidates: &[usize]) -> Option<usize> {
		for &idx in candidates {
			let url = self.state.read().await.endpoints[idx].url.clone();
			let started = Instant::now();
			let result = transport.try_connect(&url).await;
			let elapsed = started.elapsed();

			let mut state = self.state.write().await;
			let endpoint = &mut state.endpoints[idx];
			match result {
				Ok(()) => {
					endpoint.healthy = true;
					endpoint.latency = Some(elapsed);
					return Some(idx);
				}
				Err(e) => {
					warn!(url = %url, error = %e, "Endpoint failed connectivity check");
					endpoint.healthy = false;
				}
			}
		}
		None
	}

	async fn activate<T: RotatingTransport>(
		&self,
		transport: &T,
		idx: usize,
	) -> Result<(), BlockChainError> {
		let url = self.state.read().await.endpoints[idx].url.clone();
		transport.update_client(&url).await?;

		let mut state = self.state.write().await;
		state.active = idx;
		state.verified = true;
		Ok(())
	}

	/// Sends a raw request to the active endpoint with automatic rotation on failure
	///
	/// # Arguments
	/// * `transport` - The transport client implementing the RotatingTransport trait
	/// * `method` - The RPC method name to call
	/// * `params` - The parameters for the RPC method call
	///
	/// # Returns
	/// * `Result<Value, BlockChainError>` - The JSON response from the RPC endpoint or an error
	///
	/// # Behavior
	/// - Rotates on network errors and on the status codes in `ROTATE_ON_ERROR_CODES`
	/// - Tries each endpoint at most once per call
	pub async fn send_raw_request<T, P>(
		&self,
		transport: &T,
		method: &str,
		params: Option<P>,
	) -> Result<Value, BlockChainError>
	where
		T: RotatingTransport,
		P: Into<Value> + Send + Clone + Serialize,
	{
		let request_body = transport.customize_request(method, params).await;
		self.send_with_rotation(transport, &request_body).await
	}

	/// Sends a JSON-RPC batch to the active endpoint with automatic rotation on failure
	///
	/// A node rejecting the whole batch with a single error object yields
	/// `BlockChainError::RpcError`.
	pub async fn send_batch_request<T: RotatingTransport>(
		&self,
		transport: &T,
		requests: Vec<Value>,
	) -> Result<Vec<Value>, BlockChainError> {
		let request_body = Value::Array(requests);
		match self.send_with_rotation(transport, &request_body).await? {
			Value::Array(responses) => Ok(responses),
			Value::Object(object) => match object.get("error") {
				Some(error) => Err(BlockChainError::RpcError {
					code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
					message: error
						.get("message")
						.and_then(Value::as_str)
						.unwrap_or_default()
						.to_string(),
				}),
				None => Err(BlockChainError::request_error(
					"Batch response is not an array",
				)),
			},
			_ => Err(BlockChainError::request_error(
				"Batch response is not an array",
			)),
		}
	}

	async fn send_with_rotation<T: RotatingTransport>(
		&self,
		transport: &T,
		request_body: &Value,
	) -> Result<Value, BlockChainError> {
		let max_rotations = self.state.read().await.endpoints.len().saturating_sub(1);
		let mut rotations = 0;

		loop {
			let current_url = self.active_url().await;

			let response = self
				.client
				.post(current_url.as_str())
				.json(request_body)
				.send()
				.await;

			let error = match response {
				Ok(response) if response.status().is_success() => {
					return response.json().await.map_err(|e| {
						BlockChainError::request_error(format!(
							"Failed to parse JSON response: {}",
							e
						))
					});
				}
				Ok(response) => {
					let status = response.status();
					let error_body = response.text().await.unwrap_or_default();
					warn!(url = %current_url, %status, "Request failed: {}", error_body);

					let error = BlockChainError::HttpError {
						status: status.as_u16(),
						message: format!(
							"{}: {}",
							status.canonical_reason().unwrap_or("Unknown"),
							error_body
						),
					};
					if !ROTATE_ON_ERROR_CODES.contains(&status.as_u16()) {
						return Err(error);
					}
					error
				}
				Err(network_error) => {
					warn!(url = %current_url, "Network error while sending request: {}", network_error);
					BlockChainError::connection_error(format!("{}: {}", current_url, network_error))
				}
			};

			if rotations >= max_rotations {
				return Err(error);
			}

			match self.rotate_url(transport, &current_url).await {
				Ok(()) => rotations += 1,
				Err(rotation_error) => {
					debug!(error = %rotation_error, "Rotation failed");
					return Err(error);
				}
			}
		}
	}
}
