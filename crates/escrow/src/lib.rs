//! Escrow transaction subsystem.
//!
//! A deterministic state machine that lets a sender lock coins addressed
//! to a per-escrow account, governed by an arbiter, releasable to a
//! recipient before a deadline or returnable to the sender after expiry.
//!
//! # Lifecycle
//!
//! ```text
//! (none) --create--------------> Active[amount, timeout]
//! Active --release(partial)----> Active[amount', timeout]
//! Active --release(full)-------> (deleted)
//! Active --return (h>timeout)--> (deleted)
//! Active --update (h<=timeout)-> Active[parties changed]
//! ```
//!
//! No other transition is permitted; once deleted, an id is permanently
//! unreachable. For every persisted escrow, the coins held at its
//! derived address equal the record's `amount`; partial releases
//! decrement both in lockstep.

mod bucket;
mod handler;
mod state;

pub use bucket::EscrowBucket;
pub use handler::{
    register_query, register_routes, CreateEscrowHandler, ReleaseEscrowHandler,
    ReturnEscrowHandler, UpdateEscrowHandler,
};
pub use state::{Escrow, EscrowObject};

use mooring_cash::CashController;
use mooring_core::{Authenticator, Router, SavepointDecorator};

/// Assemble the escrow routes behind the savepoint decorator.
///
/// This is the minimal deliverable stack: Check runs state-isolated and
/// Deliver rolls back atomically on error. A full deployment chains the
/// logging, recovery, signature, and fee decorators outside this one.
pub fn stack<A, C>(auth: A, cash: C) -> SavepointDecorator<Router>
where
    A: Authenticator + Clone + 'static,
    C: CashController + Clone + 'static,
{
    let mut router = Router::new();
    register_routes(&mut router, auth, cash);
    SavepointDecorator::new(router)
}
