//! Ethereum Virtual Machine (EVM) wire types.
//!
//! Only the fields the staker reads or writes are modelled; everything else a node
//! returns is ignored while deserializing.

mod batch;
mod block;
mod transaction;

pub use batch::BatchElem;
pub use block::EvmBlockHeader;
pub use transaction::{CallRequest, EvmLog, EvmReceipt, LogFilter};
