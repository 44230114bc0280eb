//! The failure taxonomy consumed by the outer pipeline.

use mooring_messages::MsgError;
use mooring_store::StoreError;
use mooring_types::{BlockHeight, CoinError};
use thiserror::Error;

/// Errors surfaced by Check and Deliver.
///
/// The outer decorator stack reacts to the kind: every kind rolls the
/// transaction back to the enclosing savepoint, fees are retained by the
/// fee decorator sitting outside it, and the recovery decorator handles
/// panics. Handlers never catch their own errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The message decoded to a variant this handler does not serve.
    #[error("unknown transaction type routed as {0}")]
    UnknownTxType(&'static str),

    /// Static message validation failed.
    #[error("invalid message: {0}")]
    InvalidMsg(#[from] MsgError),

    /// Escrow creation with a timeout at or below the current height.
    #[error("invalid timeout {0}: must exceed current height")]
    InvalidTimeout(BlockHeight),

    /// No escrow record under the given id.
    #[error("no escrow with id {}", hex::encode(.0))]
    NoSuchEscrow(Vec<u8>),

    /// Release or update on an escrow past its timeout.
    #[error("escrow expired at height {0}")]
    EscrowExpired(BlockHeight),

    /// Return on an escrow that has not yet expired.
    #[error("escrow not expired: timeout is height {0}")]
    EscrowNotExpired(BlockHeight),

    /// The required signer did not sign this transaction.
    #[error("unauthorized")]
    Unauthorized,

    /// A coin subtraction would underflow.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(#[from] CoinError),

    /// The underlying key-value store failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}
