//! Core services of the staker.
//!
//! - `account`: signing key resolution from encrypted keystores
//! - `blockchain`: RPC endpoint pool, client, invoker and batch caller
//! - `transaction`: gas computation, transaction building and submission

pub mod account;
pub mod blockchain;
pub mod transaction;
