//! Escrow release message.

use crate::MsgError;
use mooring_types::Coins;
use sbor::prelude::*;

/// Release locked coins to the recipient. Only the arbiter may deliver
/// this, and only while the escrow has not expired.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct ReleaseEscrowMsg {
    /// Bucket-assigned id of the escrow.
    pub escrow_id: Vec<u8>,
    /// Coins to release. Empty means the full remaining balance, which
    /// drains and deletes the escrow.
    pub amount: Coins,
}

impl ReleaseEscrowMsg {
    /// Release the full remaining balance.
    pub fn full(escrow_id: impl Into<Vec<u8>>) -> Self {
        Self {
            escrow_id: escrow_id.into(),
            amount: Coins::empty(),
        }
    }

    /// Release a specific amount.
    pub fn partial(escrow_id: impl Into<Vec<u8>>, amount: Coins) -> Self {
        Self {
            escrow_id: escrow_id.into(),
            amount,
        }
    }

    /// Static validation: non-empty id; if an amount is given, it must be
    /// well-formed and strictly positive. Whether the escrow can cover the
    /// request is decided at delivery by the coin movement itself.
    pub fn validate(&self) -> Result<(), MsgError> {
        if self.escrow_id.is_empty() {
            return Err(MsgError::EmptyEscrowId);
        }
        if !self.amount.is_empty() {
            self.amount.validate()?;
            if !self.amount.is_positive() {
                return Err(MsgError::NonPositiveAmount);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_types::Coin;

    #[test]
    fn test_full_release_valid() {
        assert!(ReleaseEscrowMsg::full(1u64.to_be_bytes()).validate().is_ok());
    }

    #[test]
    fn test_partial_release_valid() {
        let amount = Coins::new(vec![Coin::whole(3, "IOV")]).unwrap();
        let msg = ReleaseEscrowMsg::partial(1u64.to_be_bytes(), amount);
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_empty_id_rejected() {
        let msg = ReleaseEscrowMsg::full(Vec::new());
        assert_eq!(msg.validate().unwrap_err(), MsgError::EmptyEscrowId);
    }
}
