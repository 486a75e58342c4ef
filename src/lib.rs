//! RPC orchestration and transaction submission for an oracle staker node.
//!
//! Workflow tasks (stake, vote, propose, dispute) reach the chain exclusively through
//! this crate:
//!
//! - `models`: network configuration, transaction options and EVM wire types
//! - `services::blockchain`: the RPC endpoint pool, the EVM client, the generic
//!   invoker and the batch caller, all wrapped by the retry policy
//! - `services::transaction`: gas estimation and transaction building
//! - `services::account`: signing keys from encrypted keystores
//! - `utils`: retry policy, HTTP clients, logging and gas arithmetic

pub mod models;
pub mod services;
pub mod utils;
