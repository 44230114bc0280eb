//! The two-phase handler contract.

use crate::{Context, HandlerError, Tx};
use mooring_store::KvStore;

/// A message handler with speculative and authoritative phases.
///
/// # Guarantees
///
/// - **Synchronous**: neither phase blocks or awaits.
/// - **Deterministic**: same state + same transaction = same result on
///   every replica. Check and Deliver must agree on validity.
/// - **Rollback by decorator**: handlers surface errors and never undo
///   their own writes; the enclosing savepoint reverts them.
pub trait Handler {
    /// Speculatively validate `tx` and return its gas cost.
    ///
    /// Runs against a state-isolated view; any writes are discarded by
    /// the savepoint decorator.
    fn check(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<CheckResult, HandlerError>;

    /// Execute `tx` against the authoritative state.
    fn deliver(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<DeliverResult, HandlerError>;
}

/// Result of a successful Check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckResult {
    /// Flat gas cost allocated to executing this transaction.
    pub gas_allocated: u64,
}

impl CheckResult {
    /// A check result allocating the given gas.
    pub fn with_gas(gas_allocated: u64) -> Self {
        Self { gas_allocated }
    }
}

/// Result of a successful Deliver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliverResult {
    /// Handler-specific payload, e.g. the id of a created object.
    pub data: Vec<u8>,
    /// Free-form log line for clients.
    pub log: String,
    /// Indexable key-value tags.
    pub tags: Vec<Tag>,
}

impl DeliverResult {
    /// A deliver result carrying the given payload.
    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }
}

/// An indexable key-value pair attached to a deliver result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag key.
    pub key: Vec<u8>,
    /// Tag value.
    pub value: Vec<u8>,
}
