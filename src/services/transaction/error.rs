//! Transaction error types.

use alloy::primitives::B256;
use thiserror::Error;

use crate::services::{account::AccountError, blockchain::BlockChainError};

/// Errors that can occur while preparing or submitting a transaction
#[derive(Debug, Error)]
pub enum TransactionError {
	#[error(transparent)]
	Account(#[from] AccountError),

	#[error(transparent)]
	BlockChain(#[from] BlockChainError),

	#[error("Gas estimation failed: {0}")]
	GasEstimation(String),

	#[error("Signing failed: {0}")]
	Signing(String),

	#[error("Transaction {hash} not mined after {polls} polls")]
	ConfirmationTimeout { hash: B256, polls: u32 },
}
