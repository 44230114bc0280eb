//! The persisted escrow record and its derived address.

use mooring_types::{Address, BlockHeight, Coins, Permission};
use sbor::prelude::*;
use std::fmt;

/// A persisted escrow: coins locked at a derived address, governed by an
/// arbiter, releasable to the recipient before the timeout or returnable
/// to the sender after it.
///
/// The record serializes canonically via SBOR; replicas persist and hash
/// byte-identical encodings.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Escrow {
    /// Party that funded the escrow; coins return here on expiry.
    pub sender: Permission,
    /// Beneficiary on release.
    pub recipient: Permission,
    /// Sole authority to release before the timeout.
    pub arbiter: Permission,
    /// Locked coins. Always strictly positive while the record exists; a
    /// record whose amount would become empty is deleted instead.
    pub amount: Coins,
    /// Expiry height. Active while `height <= timeout`.
    pub timeout: BlockHeight,
    /// Opaque note carried from the create message.
    pub memo: String,
}

impl Escrow {
    /// True while the escrow has not expired at `height`.
    pub fn is_active(&self, height: BlockHeight) -> bool {
        height <= self.timeout
    }
}

/// An escrow record together with its bucket-assigned id.
#[derive(Clone, PartialEq, Eq)]
pub struct EscrowObject {
    id: Vec<u8>,
    /// The record. The id is fixed for the object's lifetime; the record
    /// is what handlers mutate.
    pub escrow: Escrow,
}

impl EscrowObject {
    /// Pair an id with its record.
    pub fn new(id: Vec<u8>, escrow: Escrow) -> Self {
        Self { id, escrow }
    }

    /// The bucket-assigned id.
    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// The address holding this escrow's locked coins, derived from the
    /// id under the escrow domain tag. Stable across replicas.
    pub fn address(&self) -> Address {
        Permission::escrow(&self.id).address()
    }
}

impl fmt::Debug for EscrowObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EscrowObject")
            .field("id", &hex::encode(&self.id))
            .field("escrow", &self.escrow)
            .finish()
    }
}
