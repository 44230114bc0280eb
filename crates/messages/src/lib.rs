//! Escrow message types.
//!
//! A transaction carries exactly one message. The four escrow variants are
//! collected in the exhaustive [`Msg`] enum so the router boundary can
//! pattern-match without type erasure; each variant knows its route path
//! and its static validation rules.
//!
//! Static validation covers everything that can be decided without state
//! access. Height-dependent rules (timeout vs. current height) and
//! record-dependent rules (authorization, balances) belong to the
//! handlers.

mod create;
mod release;
mod return_escrow;
mod update;

pub use create::{CreateEscrowMsg, MAX_MEMO_LEN};
pub use release::ReleaseEscrowMsg;
pub use return_escrow::ReturnEscrowMsg;
pub use update::UpdateEscrowPartiesMsg;

use mooring_types::{CoinError, PermissionError};
use sbor::prelude::*;

/// Route path for [`CreateEscrowMsg`].
pub const PATH_CREATE_ESCROW: &str = "escrow/create";
/// Route path for [`ReleaseEscrowMsg`].
pub const PATH_RELEASE_ESCROW: &str = "escrow/release";
/// Route path for [`ReturnEscrowMsg`].
pub const PATH_RETURN_ESCROW: &str = "escrow/return";
/// Route path for [`UpdateEscrowPartiesMsg`].
pub const PATH_UPDATE_ESCROW: &str = "escrow/update";

/// The message carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub enum Msg {
    /// Lock coins into a new escrow.
    CreateEscrow(CreateEscrowMsg),
    /// Release locked coins to the recipient (arbiter only).
    ReleaseEscrow(ReleaseEscrowMsg),
    /// Return an expired escrow's coins to the sender.
    ReturnEscrow(ReturnEscrowMsg),
    /// Replace party permissions on an active escrow.
    UpdateEscrowParties(UpdateEscrowPartiesMsg),
}

impl Msg {
    /// The route path this message dispatches under.
    pub fn path(&self) -> &'static str {
        match self {
            Msg::CreateEscrow(_) => PATH_CREATE_ESCROW,
            Msg::ReleaseEscrow(_) => PATH_RELEASE_ESCROW,
            Msg::ReturnEscrow(_) => PATH_RETURN_ESCROW,
            Msg::UpdateEscrowParties(_) => PATH_UPDATE_ESCROW,
        }
    }

    /// Run the variant's static validation.
    pub fn validate(&self) -> Result<(), MsgError> {
        match self {
            Msg::CreateEscrow(msg) => msg.validate(),
            Msg::ReleaseEscrow(msg) => msg.validate(),
            Msg::ReturnEscrow(msg) => msg.validate(),
            Msg::UpdateEscrowParties(msg) => msg.validate(),
        }
    }
}

/// Static validation failures, surfaced before any store access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MsgError {
    /// A required permission field is malformed.
    #[error("invalid {field} permission: {source}")]
    Permission {
        /// Which field failed.
        field: &'static str,
        /// The underlying permission error.
        source: PermissionError,
    },

    /// The amount field is malformed.
    #[error("invalid amount: {0}")]
    Amount(#[from] CoinError),

    /// The amount must be non-empty with strictly positive entries.
    #[error("amount must be positive")]
    NonPositiveAmount,

    /// The escrow id is empty.
    #[error("empty escrow id")]
    EmptyEscrowId,

    /// The memo exceeds the maximum length.
    #[error("memo exceeds {MAX_MEMO_LEN} bytes")]
    MemoTooLong,

    /// An update names no party field to change.
    #[error("no party fields to update")]
    NoPartiesToUpdate,
}

pub(crate) fn validate_permission(
    field: &'static str,
    permission: &mooring_types::Permission,
) -> Result<(), MsgError> {
    permission
        .validate()
        .map_err(|source| MsgError::Permission { field, source })
}
