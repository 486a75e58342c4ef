use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc,
};

use futures::future::join_all;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{json, Value};
use tokio::{
	io::{AsyncReadExt, AsyncWriteExt},
	net::{TcpListener, TcpStream},
};

use oracle_staker::services::blockchain::{
	BlockChainError, BlockchainTransport, HttpTransportClient, RotatingTransport, RpcParameters,
};

use crate::integration::mocks::create_test_network;

fn mock_health_check(server: &mut ServerGuard, status: usize) -> Mock {
	server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({"method": "eth_chainId"})))
		.with_status(status)
		.with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x539"}"#)
}

fn mock_block_number(server: &mut ServerGuard, status: usize, result: &str) -> Mock {
	server
		.mock("POST", "/")
		.match_body(Matcher::PartialJson(json!({"method": "eth_blockNumber"})))
		.with_status(status)
		.with_body(json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string())
}

/// Reads one HTTP request, headers and body
async fn read_request(socket: &mut TcpStream) -> std::io::Result<()> {
	let mut request = Vec::new();
	let mut buf = [0u8; 1024];
	loop {
		let read = socket.read(&mut buf).await?;
		if read == 0 {
			return Ok(());
		}
		request.extend_from_slice(&buf[..read]);

		let text = String::from_utf8_lossy(&request);
		if let Some(end) = text.find("\r\n\r\n") {
			let length = text[..end]
				.lines()
				.filter_map(|line| line.split_once(':'))
				.find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
				.and_then(|(_, value)| value.trim().parse::<usize>().ok())
				.unwrap_or(0);
			if request.len() >= end + 4 + length {
				return Ok(());
			}
		}
	}
}

/// Endpoint that passes its first connectivity check and then stops answering
///
/// Returns the URL and the number of connections accepted so far.
async fn stalling_endpoint() -> (String, Arc<AtomicUsize>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let url = format!("http://{}", listener.local_addr().unwrap());
	let connections = Arc::new(AtomicUsize::new(0));
	let accepted = connections.clone();

	tokio::spawn(async move {
		while let Ok((mut socket, _)) = listener.accept().await {
			let first = accepted.fetch_add(1, Ordering::SeqCst) == 0;
			tokio::spawn(async move {
				if read_request(&mut socket).await.is_err() {
					return;
				}
				if first {
					let body = r#"{"jsonrpc":"2.0","id":1,"result":"0x539"}"#;
					let response = format!(
						"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
						body.len(),
						body
					);
					let _ = socket.write_all(response.as_bytes()).await;
					return;
				}
				// Hold the connection open without answering
				let mut buf = [0u8; 1024];
				while let Ok(read) = socket.read(&mut buf).await {
					if read == 0 {
						break;
					}
				}
			});
		}
	});

	(url, connections)
}

fn params_for(urls: Vec<(String, u32)>, max_retries: u32) -> RpcParameters<HttpTransportClient> {
	RpcParameters::from_network(&create_test_network(urls, max_retries)).unwrap()
}

#[tokio::test]
async fn test_first_call_connects_to_highest_weight_endpoint() {
	let mut primary = Server::new_async().await;
	let mut secondary = Server::new_async().await;

	let primary_health = mock_health_check(&mut primary, 200)
		.create_async()
		.await;
	let primary_block = mock_block_number(&mut primary, 200, "0x10")
		.create_async()
		.await;
	let secondary_health = mock_health_check(&mut secondary, 200)
		.expect(0)
		.create_async()
		.await;

	let params = params_for(vec![(secondary.url(), 10), (primary.url(), 90)], 1);
	assert_eq!(params.block_number_with_retry().await.unwrap(), 16);

	let client = params.get_best_rpc_client().await.unwrap();
	assert_eq!(client.transport().get_current_url().await, primary.url());

	primary_health.assert_async().await;
	primary_block.assert_async().await;
	secondary_health.assert_async().await;
}

#[tokio::test]
async fn test_rotation_on_rate_limit() {
	let mut primary = Server::new_async().await;
	let mut secondary = Server::new_async().await;

	let _primary_health = mock_health_check(&mut primary, 200)
		.create_async()
		.await;
	let throttled = mock_block_number(&mut primary, 429, "0x0")
		.expect(1)
		.create_async()
		.await;
	let _secondary_health = mock_health_check(&mut secondary, 200)
		.create_async()
		.await;
	let answered = mock_block_number(&mut secondary, 200, "0x2a")
		.expect(1)
		.create_async()
		.await;

	let params = params_for(vec![(primary.url(), 100), (secondary.url(), 50)], 1);
	assert_eq!(params.block_number_with_retry().await.unwrap(), 42);

	let client = params.get_best_rpc_client().await.unwrap();
	let transport = client.transport();
	assert_eq!(transport.get_current_url().await, secondary.url());

	let endpoints = transport.endpoint_manager().endpoints().await;
	assert!(!endpoints[0].healthy);
	assert!(endpoints[1].healthy);

	throttled.assert_async().await;
	answered.assert_async().await;
}

#[tokio::test]
async fn test_rotation_on_service_unavailable() {
	let mut primary = Server::new_async().await;
	let mut secondary = Server::new_async().await;

	let _primary_health = mock_health_check(&mut primary, 200)
		.create_async()
		.await;
	let _primary_block = mock_block_number(&mut primary, 503, "0x0")
		.create_async()
		.await;
	let _secondary_health = mock_health_check(&mut secondary, 200)
		.create_async()
		.await;
	let _secondary_block = mock_block_number(&mut secondary, 200, "0x7")
		.create_async()
		.await;

	let params = params_for(vec![(primary.url(), 100), (secondary.url(), 50)], 1);
	assert_eq!(params.block_number_with_retry().await.unwrap(), 7);

	let client = params.get_best_rpc_client().await.unwrap();
	assert_eq!(client.transport().get_current_url().await, secondary.url());
}

#[tokio::test]
async fn test_unreachable_endpoint_is_skipped() {
	let mut secondary = Server::new_async().await;

	let _secondary_health = mock_health_check(&mut secondary, 200)
		.create_async()
		.await;
	let _secondary_block = mock_block_number(&mut secondary, 200, "0x1")
		.create_async()
		.await;

	let params = params_for(
		vec![
			("http://127.0.0.1:1".to_string(), 100),
			(secondary.url(), 50),
		],
		1,
	);
	assert_eq!(params.block_number_with_retry().await.unwrap(), 1);

	let client = params.get_best_rpc_client().await.unwrap();
	let endpoints = client.transport().endpoint_manager().endpoints().await;
	assert!(!endpoints[0].healthy);
	assert!(endpoints[1].healthy);
	assert!(endpoints[1].latency.is_some());
}

#[tokio::test]
async fn test_all_endpoints_failing() {
	let mut primary = Server::new_async().await;
	let mut secondary = Server::new_async().await;

	let _primary_health = mock_health_check(&mut primary, 500)
		.create_async()
		.await;
	let _secondary_health = mock_health_check(&mut secondary, 500)
		.create_async()
		.await;

	let params = params_for(vec![(primary.url(), 100), (secondary.url(), 50)], 1);
	let result = params.block_number_with_retry().await;

	assert!(matches!(result, Err(BlockChainError::NoHealthyEndpoint)));
}

#[tokio::test]
async fn test_client_error_does_not_rotate() {
	let mut primary = Server::new_async().await;
	let mut secondary = Server::new_async().await;

	let _primary_health = mock_health_check(&mut primary, 200)
		.create_async()
		.await;
	let _primary_block = mock_block_number(&mut primary, 400, "0x0")
		.create_async()
		.await;
	let untouched = mock_block_number(&mut secondary, 200, "0x1")
		.expect(0)
		.create_async()
		.await;

	let params = params_for(vec![(primary.url(), 100), (secondary.url(), 50)], 1);
	let result = params.block_number_with_retry().await;

	assert!(matches!(
		result,
		Err(BlockChainError::HttpError { status: 400, .. })
	));
	let client = params.get_best_rpc_client().await.unwrap();
	assert_eq!(client.transport().get_current_url().await, primary.url());
	untouched.assert_async().await;
}

#[tokio::test]
async fn test_stale_rotation_is_ignored() {
	let mut primary = Server::new_async().await;
	let secondary = Server::new_async().await;

	let _primary_health = mock_health_check(&mut primary, 200)
		.create_async()
		.await;

	let network = create_test_network(vec![(primary.url(), 100), (secondary.url(), 50)], 1);
	let transport = HttpTransportClient::new(&network).unwrap();
	transport.ensure_connected().await.unwrap();

	let manager = transport.endpoint_manager();
	manager.rotate_url(&transport, &secondary.url()).await.unwrap();

	assert_eq!(manager.active_url().await, primary.url());
	assert!(manager.endpoints().await.iter().all(|endpoint| endpoint.healthy));
}

#[tokio::test]
async fn test_try_connect_rejects_invalid_url() {
	let network = create_test_network(vec![("http://localhost:8545".to_string(), 100)], 1);
	let transport = HttpTransportClient::new(&network).unwrap();

	let result = transport.try_connect("not a url").await;
	assert!(matches!(result, Err(BlockChainError::ConfigError(_))));
}

#[tokio::test]
async fn test_stalled_endpoint_is_rotated_away_from() {
	let (stalled_url, stalled_connections) = stalling_endpoint().await;
	let mut secondary = Server::new_async().await;

	let _secondary_health = mock_health_check(&mut secondary, 200)
		.create_async()
		.await;
	let answered = mock_block_number(&mut secondary, 200, "0x64")
		.expect_at_least(1)
		.create_async()
		.await;

	let mut network = create_test_network(
		vec![(stalled_url.clone(), 100), (secondary.url(), 50)],
		3,
	);
	network.rpc_timeout_ms = 300;
	let params = RpcParameters::from_network(&network).unwrap();

	assert_eq!(params.block_number_with_retry().await.unwrap(), 100);

	let client = params.get_best_rpc_client().await.unwrap();
	let transport = client.transport();
	assert_eq!(transport.get_current_url().await, secondary.url());

	let endpoints = transport.endpoint_manager().endpoints().await;
	assert_eq!(endpoints[0].url, stalled_url);
	assert!(!endpoints[0].healthy);
	assert!(endpoints[1].healthy);
	// One connectivity check plus the request that stalled
	assert!(stalled_connections.load(Ordering::SeqCst) >= 2);
	answered.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_requests_rotate_once() {
	let mut primary = Server::new_async().await;
	let mut secondary = Server::new_async().await;

	let primary_health = mock_health_check(&mut primary, 200)
		.expect(1)
		.create_async()
		.await;
	let _primary_block = mock_block_number(&mut primary, 503, "0x0")
		.create_async()
		.await;
	let secondary_health = mock_health_check(&mut secondary, 200)
		.expect(1)
		.create_async()
		.await;
	let secondary_block = mock_block_number(&mut secondary, 200, "0x2a")
		.expect(8)
		.create_async()
		.await;

	let network = create_test_network(vec![(primary.url(), 100), (secondary.url(), 50)], 1);
	let transport = HttpTransportClient::new(&network).unwrap();
	transport.ensure_connected().await.unwrap();

	let handles = (0..8).map(|_| {
		let transport = transport.clone();
		tokio::spawn(async move {
			transport
				.send_raw_request("eth_blockNumber", None::<Value>)
				.await
		})
	});
	let responses = join_all(handles).await;

	for response in responses {
		let response = response.unwrap().unwrap();
		assert_eq!(response["result"], "0x2a");
	}

	let manager = transport.endpoint_manager();
	assert_eq!(manager.active_url().await, secondary.url());
	let endpoints = manager.endpoints().await;
	assert!(!endpoints[0].healthy);
	assert!(endpoints[1].healthy);

	primary_health.assert_async().await;
	secondary_health.assert_async().await;
	secondary_block.assert_async().await;
}
