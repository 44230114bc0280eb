//! Authorization predicate over verified signers.

use crate::Context;
use mooring_types::{Address, Permission};

/// Decides whether the current transaction speaks for an address.
///
/// Signature verification happens in an outer decorator that populates
/// the context; handlers only ever ask this predicate. Keeping it a trait
/// lets tests substitute arbitrary signer sets and lets deployments
/// compose multiple authentication schemes.
pub trait Authenticator {
    /// True iff the transaction's verified signers include `addr`.
    fn has_address(&self, ctx: &Context, addr: &Address) -> bool;

    /// The first verified signer, used as the default escrow sender.
    fn main_signer<'a>(&self, ctx: &'a Context) -> Option<&'a Permission>;
}

/// The standard authenticator: reads the signers the signature decorator
/// placed in the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignerAuth;

impl Authenticator for SignerAuth {
    fn has_address(&self, ctx: &Context, addr: &Address) -> bool {
        ctx.signers().iter().any(|p| p.address() == *addr)
    }

    fn main_signer<'a>(&self, ctx: &'a Context) -> Option<&'a Permission> {
        ctx.signers().first()
    }
}
