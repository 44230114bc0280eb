//! Addresses and permissions.
//!
//! A [`Permission`] identifies an authorization principal as a prefix-tagged
//! opaque byte value. Its [`Address`] is the truncated Blake3 digest of the
//! tagged bytes, so two permissions with the same tag and data always map to
//! the same address on every replica, and distinct tags partition the
//! address space into non-overlapping domains.

use crate::Hash;
use sbor::prelude::*;
use std::fmt;

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Maximum length of a permission tag in bytes.
const MAX_TAG_LEN: usize = 16;

/// Maximum length of permission data in bytes.
const MAX_DATA_LEN: usize = 64;

/// Domain tag for escrow-held funds. Addresses under this tag are derived
/// from bucket-assigned escrow ids, never from user keys.
const ESCROW_TAG: &str = "escrow";

/// A 20-byte account address: the truncated Blake3 digest of a permission.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, BasicSbor)]
#[sbor(transparent)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Derive an address by hashing the given preimage and truncating.
    pub fn from_preimage(preimage: &[u8]) -> Self {
        let digest = Hash::from_bytes(preimage);
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&digest.as_bytes()[..ADDRESS_LEN]);
        Self(out)
    }

    /// Get the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Render as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// An authorization principal: a prefix-tagged opaque byte value.
///
/// The tag partitions principals into domains (`sigs` for key-derived
/// signers, `escrow` for escrow-held funds, ...). The data is opaque to
/// everything except the authenticator that produced it.
#[derive(Clone, PartialEq, Eq, Hash, BasicSbor)]
pub struct Permission {
    tag: String,
    data: Vec<u8>,
}

impl Permission {
    /// Create a permission from a tag and opaque data.
    pub fn new(tag: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            tag: tag.into(),
            data: data.into(),
        }
    }

    /// The permission holding an escrow's locked coins, derived from the
    /// bucket-assigned escrow id. Injective in `id` for the fixed tag.
    pub fn escrow(id: &[u8]) -> Self {
        Self::new(ESCROW_TAG, id)
    }

    /// The domain tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The opaque data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Canonical byte form: `tag ‖ '/' ‖ data`.
    ///
    /// The separator cannot appear in a valid tag, so the encoding is
    /// injective over well-formed permissions.
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.tag.len() + 1 + self.data.len());
        out.extend_from_slice(self.tag.as_bytes());
        out.push(b'/');
        out.extend_from_slice(&self.data);
        out
    }

    /// Derive the account address for this permission.
    pub fn address(&self) -> Address {
        Address::from_preimage(&self.bytes())
    }

    /// Check well-formedness: tag is 1..=16 bytes of `[a-z_]`, data is
    /// 1..=64 bytes.
    pub fn validate(&self) -> Result<(), PermissionError> {
        if self.tag.is_empty() || self.tag.len() > MAX_TAG_LEN {
            return Err(PermissionError::BadTag(self.tag.clone()));
        }
        if !self
            .tag
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b == b'_')
        {
            return Err(PermissionError::BadTag(self.tag.clone()));
        }
        if self.data.is_empty() || self.data.len() > MAX_DATA_LEN {
            return Err(PermissionError::BadData(self.data.len()));
        }
        Ok(())
    }
}

impl fmt::Debug for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tag, hex::encode(&self.data))
    }
}

/// Errors from permission validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// Tag is empty, too long, or contains characters outside `[a-z_]`.
    #[error("invalid permission tag {0:?}")]
    BadTag(String),

    /// Data is empty or exceeds the maximum length.
    #[error("invalid permission data length {0}")]
    BadData(usize),
}
