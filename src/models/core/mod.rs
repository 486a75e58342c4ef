mod network;
mod transaction;

pub use network::{GasConfig, Network, RpcUrl};
pub use transaction::TransactionOptions;
