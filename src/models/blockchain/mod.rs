//! Blockchain wire models.
//!
//! The staker only speaks to EVM-compatible chains, so everything lives in [`evm`].

pub mod evm;
