//! Per-transaction execution context.

use mooring_messages::Msg;
use mooring_types::{BlockHeight, Permission};

/// Immutable context for one transaction execution.
///
/// The height comes from the block being processed. The signers are
/// populated by the outer signature-verification decorator before the
/// handler runs; handlers never touch signatures directly.
#[derive(Debug, Clone)]
pub struct Context {
    height: BlockHeight,
    signers: Vec<Permission>,
}

impl Context {
    /// Create a context at the given block height with no signers.
    pub fn new(height: BlockHeight) -> Self {
        Self {
            height,
            signers: Vec::new(),
        }
    }

    /// Add a verified signer. The first signer added is the main signer.
    pub fn with_signer(mut self, signer: Permission) -> Self {
        self.signers.push(signer);
        self
    }

    /// Current block height.
    pub fn height(&self) -> BlockHeight {
        self.height
    }

    /// Verified signers, in signature order.
    pub fn signers(&self) -> &[Permission] {
        &self.signers
    }
}

/// A transaction: exactly one message.
///
/// Other transaction envelope concerns (fees, nonces, signatures) live in
/// outer decorators and are not visible to handlers.
#[derive(Debug, Clone)]
pub struct Tx {
    msg: Msg,
}

impl Tx {
    /// Wrap a message in a transaction.
    pub fn new(msg: Msg) -> Self {
        Self { msg }
    }

    /// The carried message.
    pub fn msg(&self) -> &Msg {
        &self.msg
    }
}
