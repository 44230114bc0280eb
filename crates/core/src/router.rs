//! Message-path routing.

use crate::{CheckResult, Context, DeliverResult, Handler, HandlerError, Tx};
use mooring_store::KvStore;
use std::collections::HashMap;
use tracing::trace;

/// Routes each transaction to the handler registered for its message
/// path.
///
/// The router is itself a [`Handler`], so decorators wrap it uniformly.
/// Registration happens once at startup; registering the same path twice
/// is a wiring bug and panics.
#[derive(Default)]
pub struct Router {
    routes: HashMap<&'static str, Box<dyn Handler>>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `path` to `handler`.
    ///
    /// # Panics
    ///
    /// Panics if the path is already bound.
    pub fn handle(&mut self, path: &'static str, handler: Box<dyn Handler>) {
        if self.routes.insert(path, handler).is_some() {
            panic!("duplicate route registration for {path}");
        }
    }

    fn route(&self, tx: &Tx) -> Result<&dyn Handler, HandlerError> {
        let path = tx.msg().path();
        match self.routes.get(path) {
            Some(handler) => {
                trace!(path, "dispatching");
                Ok(handler.as_ref())
            }
            None => Err(HandlerError::UnknownTxType(path)),
        }
    }
}

impl Handler for Router {
    fn check(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<CheckResult, HandlerError> {
        self.route(tx)?.check(ctx, db, tx)
    }

    fn deliver(
        &self,
        ctx: &Context,
        db: &mut dyn KvStore,
        tx: &Tx,
    ) -> Result<DeliverResult, HandlerError> {
        self.route(tx)?.deliver(ctx, db, tx)
    }
}
