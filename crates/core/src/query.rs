//! Read-only query routing.

use crate::HandlerError;
use mooring_store::KvStore;
use std::collections::HashMap;

/// A key-value pair returned by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Store key, including the bucket prefix.
    pub key: Vec<u8>,
    /// Raw serialized value.
    pub value: Vec<u8>,
}

/// Serves read-only lookups for one query path.
///
/// Empty `data` means "iterate everything under this path"; non-empty
/// `data` is a point lookup key. Queries never mutate state.
pub trait QueryHandler {
    /// Resolve a query against the store.
    fn query(&self, db: &dyn KvStore, data: &[u8]) -> Result<Vec<Model>, HandlerError>;
}

/// Routes query paths to their registered handlers.
#[derive(Default)]
pub struct QueryRouter {
    routes: HashMap<String, Box<dyn QueryHandler>>,
}

impl QueryRouter {
    /// Create an empty query router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `path` to `handler`.
    ///
    /// # Panics
    ///
    /// Panics if the path is already bound.
    pub fn register(&mut self, path: impl Into<String>, handler: Box<dyn QueryHandler>) {
        let path = path.into();
        if self.routes.insert(path.clone(), handler).is_some() {
            panic!("duplicate query registration for {path}");
        }
    }

    /// Resolve a query. Unknown paths yield an empty result set.
    pub fn query(
        &self,
        db: &dyn KvStore,
        path: &str,
        data: &[u8],
    ) -> Result<Vec<Model>, HandlerError> {
        match self.routes.get(path) {
            Some(handler) => handler.query(db, data),
            None => Ok(Vec::new()),
        }
    }
}
