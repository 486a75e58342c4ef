use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc,
};

use alloy::primitives::{Address, U256};
use mockall::predicate;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use oracle_staker::{
	models::GasConfig,
	services::{
		blockchain::{BlockChainError, ContractBinding},
		transaction::{GasEstimator, TransactionError},
	},
};

use crate::integration::mocks::{
	commit_args, latest_block, mock_params, rpc_error, rpc_result, staking_abi, tx_options, word,
	MockEVMTransportClient, STAKE_MANAGER,
};

const ACCOUNT: Address = Address::new([0x01; 20]);

fn bad_gateway() -> BlockChainError {
	BlockChainError::HttpError {
		status: 502,
		message: "Bad Gateway: upstream unavailable".to_string(),
	}
}

fn expect_gas_price(transport: &mut MockEVMTransportClient, response: Result<Value, BlockChainError>) {
	transport
		.expect_send_raw_request()
		.with(predicate::eq("eth_gasPrice"), predicate::always())
		.returning(move |_, _| response.clone());
}

fn expect_estimate(transport: &mut MockEVMTransportClient, response: Result<Value, BlockChainError>) {
	transport
		.expect_send_raw_request()
		.with(predicate::eq("eth_estimateGas"), predicate::always())
		.returning(move |_, _| response.clone());
}

fn expect_latest_block(transport: &mut MockEVMTransportClient, gas_limit: u64) {
	transport
		.expect_send_raw_request()
		.with(predicate::eq("eth_getBlockByNumber"), predicate::always())
		.returning(move |_, _| Ok(rpc_result(latest_block(gas_limit))));
}

#[tokio::test]
async fn test_gas_price_uses_larger_of_floor_and_suggestion() {
	let mut transport = MockEVMTransportClient::new();
	// 1 gwei suggested, 2 gwei floor
	expect_gas_price(&mut transport, Ok(rpc_result(json!("0x3b9aca00"))));
	let params = mock_params(transport, 2);

	let estimator = GasEstimator::new(GasConfig {
		gas_price_gwei: 2,
		gas_multiplier: Decimal::new(15, 1),
		..GasConfig::default()
	});

	assert_eq!(
		estimator.gas_price(&params).await,
		U256::from(3_000_000_000u64)
	);
}

#[tokio::test]
async fn test_gas_price_follows_node_above_floor() {
	let mut transport = MockEVMTransportClient::new();
	// 5 gwei suggested
	expect_gas_price(&mut transport, Ok(rpc_result(json!("0x12a05f200"))));
	let params = mock_params(transport, 2);

	let estimator = GasEstimator::new(GasConfig {
		gas_price_gwei: 1,
		..GasConfig::default()
	});

	assert_eq!(
		estimator.gas_price(&params).await,
		U256::from(5_000_000_000u64)
	);
}

#[tokio::test]
async fn test_gas_price_zero_when_node_fails_and_no_floor() {
	let mut transport = MockEVMTransportClient::new();
	expect_gas_price(
		&mut transport,
		Err(BlockChainError::connection_error("connection refused")),
	);
	let params = mock_params(transport, 2);

	let estimator = GasEstimator::new(GasConfig::default());
	assert_eq!(estimator.gas_price(&params).await, U256::ZERO);
}

#[tokio::test]
async fn test_transfer_uses_fixed_gas_limit() {
	let transport = MockEVMTransportClient::new();
	let params = mock_params(transport, 2);

	let options = tx_options(ACCOUNT, "", Vec::new(), GasConfig::default());
	let estimator = GasEstimator::new(options.gas.clone());

	assert_eq!(
		estimator
			.gas_limit(&params, &options, U256::from(1))
			.await
			.unwrap(),
		21_000
	);
}

#[tokio::test]
async fn test_gas_limit_applies_multiplier() {
	let mut transport = MockEVMTransportClient::new();
	expect_estimate(&mut transport, Ok(rpc_result(json!("0x186a0"))));
	let params = mock_params(transport, 2);

	let gas = GasConfig {
		gas_limit_multiplier: Decimal::new(15, 1),
		..GasConfig::default()
	};
	let options = tx_options(ACCOUNT, "commit", commit_args(3), gas);
	let estimator = GasEstimator::new(options.gas.clone());

	assert_eq!(
		estimator
			.gas_limit(&params, &options, U256::from(1))
			.await
			.unwrap(),
		150_000
	);
}

#[tokio::test]
async fn test_gas_limit_override_on_revert() {
	let mut transport = MockEVMTransportClient::new();
	expect_estimate(&mut transport, Ok(rpc_error(3, "execution reverted")));
	let params = mock_params(transport, 2);

	let gas = GasConfig {
		gas_limit_override: Some(400_000),
		..GasConfig::default()
	};
	let options = tx_options(ACCOUNT, "commit", commit_args(3), gas);
	let estimator = GasEstimator::new(options.gas.clone());

	assert_eq!(
		estimator
			.gas_limit(&params, &options, U256::from(1))
			.await
			.unwrap(),
		400_000
	);
}

#[tokio::test]
async fn test_gas_limit_error_without_override() {
	let mut transport = MockEVMTransportClient::new();
	expect_estimate(&mut transport, Ok(rpc_error(3, "execution reverted")));
	let params = mock_params(transport, 2);

	let options = tx_options(ACCOUNT, "commit", commit_args(3), GasConfig::default());
	let estimator = GasEstimator::new(options.gas.clone());

	let result = estimator.gas_limit(&params, &options, U256::from(1)).await;
	assert!(matches!(
		result,
		Err(TransactionError::BlockChain(BlockChainError::RpcError { code: 3, .. }))
	));
}

#[tokio::test]
async fn test_gateway_error_falls_back_to_block_gas_limit() {
	let mut transport = MockEVMTransportClient::new();
	expect_estimate(&mut transport, Err(bad_gateway()));
	expect_latest_block(&mut transport, 30_000_000);
	let params = mock_params(transport, 2);

	let gas = GasConfig {
		gas_limit_multiplier: Decimal::new(2, 0),
		..GasConfig::default()
	};
	let options = tx_options(ACCOUNT, "commit", commit_args(3), gas);
	let estimator = GasEstimator::new(options.gas.clone());

	// Scaled but capped at the block gas limit
	assert_eq!(
		estimator
			.gas_limit(&params, &options, U256::from(1))
			.await
			.unwrap(),
		30_000_000
	);
}

#[tokio::test]
async fn test_gateway_error_scales_last_known_estimate() {
	let estimates = Arc::new(AtomicUsize::new(0));
	let seen = estimates.clone();

	let mut transport = MockEVMTransportClient::new();
	transport
		.expect_send_raw_request()
		.with(predicate::eq("eth_estimateGas"), predicate::always())
		.returning(move |_, _| {
			if seen.fetch_add(1, Ordering::SeqCst) == 0 {
				Ok(rpc_result(json!("0x186a0")))
			} else {
				Err(bad_gateway())
			}
		});
	expect_latest_block(&mut transport, 30_000_000);
	let params = mock_params(transport, 1);

	let gas = GasConfig {
		gas_limit_multiplier: Decimal::new(12, 1),
		..GasConfig::default()
	};
	let options = tx_options(ACCOUNT, "commit", commit_args(3), gas);
	let estimator = GasEstimator::new(options.gas.clone());

	let first = estimator
		.gas_limit(&params, &options, U256::from(1))
		.await
		.unwrap();
	let second = estimator
		.gas_limit(&params, &options, U256::from(1))
		.await
		.unwrap();

	assert_eq!(first, 120_000);
	assert_eq!(second, 120_000);
}

#[tokio::test]
async fn test_gateway_error_without_block_uses_override() {
	let mut transport = MockEVMTransportClient::new();
	expect_estimate(&mut transport, Err(bad_gateway()));
	transport
		.expect_send_raw_request()
		.with(predicate::eq("eth_getBlockByNumber"), predicate::always())
		.returning(|_, _| Err(bad_gateway()));
	let params = mock_params(transport, 1);

	let gas = GasConfig {
		gas_limit_override: Some(250_000),
		..GasConfig::default()
	};
	let options = tx_options(ACCOUNT, "commit", commit_args(3), gas);
	let estimator = GasEstimator::new(options.gas.clone());

	assert_eq!(
		estimator
			.gas_limit(&params, &options, U256::from(1))
			.await
			.unwrap(),
		250_000
	);
}

#[tokio::test]
async fn test_gateway_error_without_block_or_override() {
	let mut transport = MockEVMTransportClient::new();
	expect_estimate(&mut transport, Err(bad_gateway()));
	transport
		.expect_send_raw_request()
		.with(predicate::eq("eth_getBlockByNumber"), predicate::always())
		.returning(|_, _| Err(bad_gateway()));
	let params = mock_params(transport, 1);

	let options = tx_options(ACCOUNT, "commit", commit_args(3), GasConfig::default());
	let estimator = GasEstimator::new(options.gas.clone());

	let result = estimator.gas_limit(&params, &options, U256::from(1)).await;
	assert!(matches!(result, Err(TransactionError::GasEstimation(_))));
}

#[tokio::test]
async fn test_reveal_pays_for_assignments() {
	let mut transport = MockEVMTransportClient::new();
	expect_estimate(&mut transport, Ok(rpc_result(json!("0x186a0"))));
	transport
		.expect_send_raw_request()
		.with(
			predicate::eq("eth_call"),
			predicate::function(|params: &Option<Value>| {
				params.as_ref().unwrap()[0]["to"] == json!(STAKE_MANAGER)
			}),
		)
		.times(1)
		.returning(|_, _| Ok(rpc_result(json!(word(3)))));
	let params = mock_params(transport, 2);

	let gas = GasConfig {
		reveal_gas_per_assignment: 20_000,
		..GasConfig::default()
	};
	let options = tx_options(ACCOUNT, "reveal", commit_args(3), gas);
	let estimator = GasEstimator::new(options.gas.clone()).with_assignment_source(
		ContractBinding::new("StakeManager", STAKE_MANAGER, staking_abi()),
	);

	assert_eq!(
		estimator
			.gas_limit(&params, &options, U256::from(1))
			.await
			.unwrap(),
		160_000
	);
}

fn expect_to_assign(transport: &mut MockEVMTransportClient, response: Value) {
	transport
		.expect_send_raw_request()
		.with(predicate::eq("eth_call"), predicate::always())
		.returning(move |_, _| Ok(response.clone()));
}

#[tokio::test]
async fn test_reveal_uses_override_when_assignment_lookup_fails() {
	let mut transport = MockEVMTransportClient::new();
	expect_estimate(&mut transport, Ok(rpc_result(json!("0x186a0"))));
	expect_to_assign(&mut transport, rpc_error(3, "execution reverted"));
	let params = mock_params(transport, 2);

	let gas = GasConfig {
		gas_limit_override: Some(400_000),
		reveal_gas_per_assignment: 20_000,
		..GasConfig::default()
	};
	let options = tx_options(ACCOUNT, "reveal", commit_args(3), gas);
	let estimator = GasEstimator::new(options.gas.clone());

	assert_eq!(
		estimator
			.gas_limit(&params, &options, U256::from(1))
			.await
			.unwrap(),
		400_000
	);
}

#[tokio::test]
async fn test_reveal_assignment_lookup_error_without_override() {
	let mut transport = MockEVMTransportClient::new();
	expect_estimate(&mut transport, Ok(rpc_result(json!("0x186a0"))));
	expect_to_assign(&mut transport, rpc_error(3, "execution reverted"));
	let params = mock_params(transport, 2);

	let gas = GasConfig {
		reveal_gas_per_assignment: 20_000,
		..GasConfig::default()
	};
	let options = tx_options(ACCOUNT, "reveal", commit_args(3), gas);
	let estimator = GasEstimator::new(options.gas.clone());

	let result = estimator.gas_limit(&params, &options, U256::from(1)).await;
	assert!(matches!(
		result,
		Err(TransactionError::BlockChain(BlockChainError::RpcError { code: 3, .. }))
	));
}
