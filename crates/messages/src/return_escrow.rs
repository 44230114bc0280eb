//! Escrow return message.

use crate::MsgError;
use sbor::prelude::*;

/// Return an expired escrow's full balance to the sender.
///
/// No signer is required: expiry itself is the gate, so anyone may
/// trigger the return once the current height strictly exceeds the
/// escrow's timeout.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct ReturnEscrowMsg {
    /// Bucket-assigned id of the escrow.
    pub escrow_id: Vec<u8>,
}

impl ReturnEscrowMsg {
    /// Create a return message for the given escrow.
    pub fn new(escrow_id: impl Into<Vec<u8>>) -> Self {
        Self {
            escrow_id: escrow_id.into(),
        }
    }

    /// Static validation: the id must be non-empty.
    pub fn validate(&self) -> Result<(), MsgError> {
        if self.escrow_id.is_empty() {
            return Err(MsgError::EmptyEscrowId);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ReturnEscrowMsg::new(1u64.to_be_bytes()).validate().is_ok());
        assert_eq!(
            ReturnEscrowMsg::new(Vec::new()).validate().unwrap_err(),
            MsgError::EmptyEscrowId
        );
    }
}
