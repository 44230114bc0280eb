//! Escrow party update message.

use crate::{validate_permission, MsgError};
use mooring_types::Permission;
use sbor::prelude::*;

/// Replace party permissions on an active escrow.
///
/// Each field is individually optional; absent fields leave the existing
/// value untouched. The amount and timeout of an escrow are immutable
/// after creation, so only the three party slots can change.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct UpdateEscrowPartiesMsg {
    /// Bucket-assigned id of the escrow.
    pub escrow_id: Vec<u8>,
    /// Replacement sender, if changing.
    pub sender: Option<Permission>,
    /// Replacement recipient, if changing.
    pub recipient: Option<Permission>,
    /// Replacement arbiter, if changing.
    pub arbiter: Option<Permission>,
}

impl UpdateEscrowPartiesMsg {
    /// Static validation: non-empty id, at least one party present, and
    /// every present party well-formed.
    pub fn validate(&self) -> Result<(), MsgError> {
        if self.escrow_id.is_empty() {
            return Err(MsgError::EmptyEscrowId);
        }
        if self.sender.is_none() && self.recipient.is_none() && self.arbiter.is_none() {
            return Err(MsgError::NoPartiesToUpdate);
        }
        if let Some(sender) = &self.sender {
            validate_permission("sender", sender)?;
        }
        if let Some(recipient) = &self.recipient {
            validate_permission("recipient", recipient)?;
        }
        if let Some(arbiter) = &self.arbiter {
            validate_permission("arbiter", arbiter)?;
        }
        Ok(())
    }
}
