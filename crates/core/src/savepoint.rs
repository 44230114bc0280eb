//! Savepoint decorator: state isolation for Check, rollback for Deliver.

use crate::{CheckResult, Context, DeliverResult, Handler, HandlerError, Tx};
use mooring_store::{KvStore, Savepoint};
use tracing::debug;

/// Wraps a handler with the savepoint contract both phases assume.
///
/// - **Check** runs against a fresh savepoint that is always discarded,
///   so speculative validation can never leak state.
/// - **Deliver** runs against a fresh savepoint that is committed only
///   when the handler succeeds. On error every KV mutation since the
///   savepoint began, record writes and coin movements alike, is
///   reverted, and the error propagates upward.
///
/// The fee decorator belongs *outside* this one so that fees are
/// retained even when the handler fails.
pub struct SavepointDecorator<H> {
    inner: H,
}

impl<H> SavepointDecorator<H> {
    /// Wrap `inner` with savepoint semantics.
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: Handler> Handler for SavepointDecorator<H> {
    fn check(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<CheckResult, HandlerError> {
        let mut savepoint = Savepoint::new(db);
        self.inner.check(ctx, &mut savepoint, tx)
        // savepoint dropped: all speculative writes discarded
    }

    fn deliver(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<DeliverResult, HandlerError> {
        let mut savepoint = Savepoint::new(db);
        match self.inner.deliver(ctx, &mut savepoint, tx) {
            Ok(result) => {
                savepoint.commit()?;
                Ok(result)
            }
            Err(err) => {
                debug!(pending = savepoint.pending(), %err, "deliver rolled back");
                Err(err)
            }
        }
    }
}
