//! Domain models and data structures for the staker.
//!
//! - `blockchain`: EVM wire types exchanged with RPC nodes
//! - `config`: Configuration loading and validation
//! - `core`: Core domain models (Network, GasConfig, TransactionOptions)

mod blockchain;
mod config;
mod core;

pub use blockchain::evm::{BatchElem, CallRequest, EvmBlockHeader, EvmLog, EvmReceipt, LogFilter};

pub use core::{GasConfig, Network, RpcUrl, TransactionOptions};

pub use config::{ConfigError, ConfigLoader};
