//! Blockchain client implementations.
//!
//! The staker only talks to EVM-compatible chains; see [`EvmClient`].

mod evm;

pub use evm::{EvmClient, EvmClientTrait};
