//! Handler contract and routing for the mooring transaction pipeline.
//!
//! Handlers are synchronous, deterministic state machines over a
//! key-value store. Each one exposes two phases:
//!
//! - **Check**: speculative validation against a state-isolated view,
//!   returning a flat gas cost. Writes are discarded.
//! - **Deliver**: authoritative execution. Writes are committed only if
//!   the handler succeeds; any error rolls the transaction back to the
//!   most recent savepoint.
//!
//! The [`Router`] binds message paths to handlers, and the
//! [`SavepointDecorator`] supplies the isolation/rollback contract both
//! phases assume. Fee charging, signature verification, logging, and
//! panic recovery are outer decorators owned by the surrounding
//! application and are out of scope here.

mod auth;
mod context;
mod error;
mod handler;
mod query;
mod router;
mod savepoint;

pub use auth::{Authenticator, SignerAuth};
pub use context::{Context, Tx};
pub use error::HandlerError;
pub use handler::{CheckResult, DeliverResult, Handler, Tag};
pub use query::{Model, QueryHandler, QueryRouter};
pub use router::Router;
pub use savepoint::SavepointDecorator;
