//! Staker node diagnostics entry point.
//!
//! Loads a network configuration, connects the RPC endpoint pool and reports what the
//! staker would work with: the active endpoint, the chain id, the latest block and
//! the gas price it would pay. With `--account` the account balance and pending nonce
//! are reported too.

use std::path::PathBuf;

use alloy::primitives::Address;
use anyhow::{anyhow, Context, Result};
use clap::{crate_version, value_parser, Arg, Command};
use dotenvy::dotenv;
use tracing::{info, instrument, warn};

use oracle_staker::{
	models::{ConfigLoader, Network},
	services::{
		blockchain::{BlockchainTransport, HttpTransportClient, RpcParameters},
		transaction::GasEstimator,
	},
	utils::logging::setup_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
	dotenv().ok();

	let matches = Command::new("oracle-staker")
		.version(crate_version!())
		.about("Checks RPC connectivity and gas settings of a staker network configuration")
		.arg(
			Arg::new("network")
				.long("network")
				.value_name("PATH")
				.help("Path to the network configuration file")
				.value_parser(value_parser!(PathBuf))
				.required(true),
		)
		.arg(
			Arg::new("account")
				.long("account")
				.value_name("ADDRESS")
				.help("Staker account to report balance and pending nonce for")
				.value_parser(value_parser!(Address)),
		)
		.get_matches();

	setup_logging().map_err(|e| anyhow!("Failed to set up logging: {}", e))?;

	let network_path = matches
		.get_one::<PathBuf>("network")
		.ok_or_else(|| anyhow!("--network is required"))?;
	let network = Network::load_from_path(network_path)
		.with_context(|| format!("Failed to load {}", network_path.display()))?;

	let params = RpcParameters::from_network(&network)?;
	run_diagnostics(&network, &params, matches.get_one::<Address>("account").copied()).await
}

#[instrument(skip_all, fields(network = %network.slug))]
async fn run_diagnostics(
	network: &Network,
	params: &RpcParameters<HttpTransportClient>,
	account: Option<Address>,
) -> Result<()> {
	let client = params.get_best_rpc_client().await?;
	let endpoint = client.transport().get_current_url().await;
	info!(%endpoint, "Connected");

	let chain_id = params.chain_id_with_retry().await?;
	if chain_id != network.chain_id {
		warn!(
			configured = network.chain_id,
			reported = chain_id,
			"Endpoint reports a different chain id"
		);
	} else {
		info!(chain_id, "Chain id matches configuration");
	}

	let latest_block = params.latest_block_with_retry().await?;
	info!(
		number = latest_block.number(),
		gas_limit = latest_block.gas_limit(),
		timestamp = latest_block.timestamp(),
		"Latest block"
	);

	let gas_price = GasEstimator::new(network.gas.clone())
		.gas_price(params)
		.await;
	info!(%gas_price, "Gas price");

	if let Some(account) = account {
		let balance = params.balance_with_retry(account).await?;
		let nonce = params.pending_nonce_with_retry(account).await?;
		info!(%account, %balance, nonce, "Account");
	}

	for endpoint in client.transport().endpoint_manager().endpoints().await {
		info!(
			url = %endpoint.url,
			weight = endpoint.weight,
			healthy = endpoint.healthy,
			latency_ms = endpoint.latency.map(|latency| latency.as_millis() as u64),
			"Endpoint"
		);
	}

	Ok(())
}
