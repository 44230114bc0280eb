//! Wallet ledger and coin movement for the mooring pipeline.
//!
//! The escrow handlers depend on exactly one operation,
//! [`CashController::move_coins`], which debits one address and credits
//! another inside the caller's KV transaction. Because every write goes
//! through the handler-supplied store, a failure rolled back by the
//! outer savepoint also reverts the coin movement.

mod controller;
mod ledger;

pub use controller::CashController;
pub use ledger::Ledger;
