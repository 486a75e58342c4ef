//! Transaction preparation and submission.
//!
//! - `gas`: gas price and gas limit computation
//! - `builder`: signing handle construction, broadcast and receipt polling

mod builder;
mod error;
mod gas;

pub use builder::{TransactOpts, TransactionBuilder};
pub use error::TransactionError;
pub use gas::{GasEstimator, GasLimitCache};
