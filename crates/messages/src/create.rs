//! Escrow creation message.

use crate::{validate_permission, MsgError};
use mooring_types::{BlockHeight, Coins, Permission};
use sbor::prelude::*;

/// Maximum memo length in bytes.
pub const MAX_MEMO_LEN: usize = 128;

/// Lock coins into a new escrow.
///
/// When `sender` is unset the main signer of the transaction substitutes,
/// so a plain user transaction needs no explicit sender field.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct CreateEscrowMsg {
    /// Party funding the escrow. Defaults to the main signer.
    pub sender: Option<Permission>,
    /// Beneficiary on release.
    pub recipient: Permission,
    /// Sole authority to release before the timeout.
    pub arbiter: Permission,
    /// Coins to lock. Non-empty, positive, unique denominations.
    pub amount: Coins,
    /// Block height after which the escrow expires. Must exceed the
    /// current height at delivery time (checked by the handler).
    pub timeout: BlockHeight,
    /// Opaque note, at most [`MAX_MEMO_LEN`] bytes.
    pub memo: String,
}

impl CreateEscrowMsg {
    /// Static validation per the field rules above.
    pub fn validate(&self) -> Result<(), MsgError> {
        if let Some(sender) = &self.sender {
            validate_permission("sender", sender)?;
        }
        validate_permission("recipient", &self.recipient)?;
        validate_permission("arbiter", &self.arbiter)?;
        self.amount.validate()?;
        if !self.amount.is_positive() {
            return Err(MsgError::NonPositiveAmount);
        }
        if self.memo.len() > MAX_MEMO_LEN {
            return Err(MsgError::MemoTooLong);
        }
        Ok(())
    }
}
