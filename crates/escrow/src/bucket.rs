//! Typed persistence for escrow records.

use crate::{Escrow, EscrowObject};
use mooring_core::{HandlerError, Model, QueryHandler, QueryRouter};
use mooring_store::{KvStore, StoreError};
use tracing::trace;

/// Prefix for all escrow bucket state.
const BUCKET_PREFIX: &[u8] = b"escrow:";

/// Reserved key inside the bucket prefix holding the big-endian id
/// counter.
const SEQ_KEY: &[u8] = b"escrow:seq";

/// Width of a bucket-assigned id in bytes.
const ID_LEN: usize = 8;

/// Typed wrapper over the KV store for escrow records.
///
/// Records live under `escrow:<id>` where `<id>` is an 8-byte big-endian
/// counter value. The counter itself sits at the reserved key
/// `escrow:seq`; it only ever increments, so ids are strictly increasing
/// and never reused even after deletion. Deliver is single-threaded per
/// block, which is all the discipline the counter needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscrowBucket;

impl EscrowBucket {
    /// Create the bucket handle.
    pub fn new() -> Self {
        Self
    }

    fn record_key(id: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(BUCKET_PREFIX.len() + id.len());
        key.extend_from_slice(BUCKET_PREFIX);
        key.extend_from_slice(id);
        key
    }

    fn encode(escrow: &Escrow) -> Result<Vec<u8>, StoreError> {
        sbor::basic_encode(escrow)
            .map_err(|e| StoreError::Backend(format!("encode escrow: {e:?}")))
    }

    fn decode(key: &[u8], raw: &[u8]) -> Result<Escrow, StoreError> {
        sbor::basic_decode(raw).map_err(|e| StoreError::Corrupt {
            key: hex::encode(key),
            reason: format!("{e:?}"),
        })
    }

    fn next_id(&self, db: &mut dyn KvStore) -> Result<Vec<u8>, HandlerError> {
        let current = match db.get(SEQ_KEY)? {
            Some(raw) => {
                let bytes: [u8; ID_LEN] = raw.as_slice().try_into().map_err(|_| {
                    StoreError::Corrupt {
                        key: hex::encode(SEQ_KEY),
                        reason: format!("sequence is {} bytes, want {ID_LEN}", raw.len()),
                    }
                })?;
                u64::from_be_bytes(bytes)
            }
            None => 0,
        };
        let next = current + 1;
        db.set(SEQ_KEY, &next.to_be_bytes())?;
        Ok(next.to_be_bytes().to_vec())
    }

    /// Assign a fresh id and persist the record under it.
    pub fn create(
        &self,
        db: &mut dyn KvStore,
        escrow: Escrow,
    ) -> Result<EscrowObject, HandlerError> {
        let id = self.next_id(db)?;
        let obj = EscrowObject::new(id, escrow);
        db.set(&Self::record_key(obj.id()), &Self::encode(&obj.escrow)?)?;
        trace!(id = %hex::encode(obj.id()), "created escrow record");
        Ok(obj)
    }

    /// Load the record under `id`, if any.
    pub fn get(&self, db: &dyn KvStore, id: &[u8]) -> Result<Option<EscrowObject>, HandlerError> {
        let key = Self::record_key(id);
        match db.get(&key)? {
            Some(raw) => {
                let escrow = Self::decode(&key, &raw)?;
                Ok(Some(EscrowObject::new(id.to_vec(), escrow)))
            }
            None => Ok(None),
        }
    }

    /// Overwrite the record at its id. Fails with
    /// [`HandlerError::NoSuchEscrow`] if the id is not present.
    pub fn save(&self, db: &mut dyn KvStore, obj: &EscrowObject) -> Result<(), HandlerError> {
        let key = Self::record_key(obj.id());
        if db.get(&key)?.is_none() {
            return Err(HandlerError::NoSuchEscrow(obj.id().to_vec()));
        }
        db.set(&key, &Self::encode(&obj.escrow)?)?;
        Ok(())
    }

    /// Remove the record. Strict: fails with
    /// [`HandlerError::NoSuchEscrow`] if the id is not present.
    pub fn delete(&self, db: &mut dyn KvStore, id: &[u8]) -> Result<(), HandlerError> {
        let key = Self::record_key(id);
        if db.get(&key)?.is_none() {
            return Err(HandlerError::NoSuchEscrow(id.to_vec()));
        }
        db.delete(&key)?;
        trace!(id = %hex::encode(id), "deleted escrow record");
        Ok(())
    }

    /// Expose this bucket read-only under `path` (point lookup by id,
    /// iteration with empty data).
    pub fn register(self, path: impl Into<String>, query_router: &mut QueryRouter) {
        query_router.register(path, Box::new(self));
    }
}

impl QueryHandler for EscrowBucket {
    fn query(&self, db: &dyn KvStore, data: &[u8]) -> Result<Vec<Model>, HandlerError> {
        if data.is_empty() {
            let models = db
                .iter_prefix(BUCKET_PREFIX)
                .filter(|(key, _)| key.as_slice() != SEQ_KEY)
                .map(|(key, value)| Model { key, value })
                .collect();
            return Ok(models);
        }
        let key = Self::record_key(data);
        Ok(db
            .get(&key)?
            .map(|value| Model { key, value })
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooring_store::MemStore;
    use mooring_types::{Coin, Coins, Permission};

    fn record(memo: &str) -> Escrow {
        Escrow {
            sender: Permission::new("sigs", &b"alice"[..]),
            recipient: Permission::new("sigs", &b"bob"[..]),
            arbiter: Permission::new("sigs", &b"carol"[..]),
            amount: Coins::new(vec![Coin::whole(10, "IOV")]).unwrap(),
            timeout: 200,
            memo: memo.into(),
        }
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut db = MemStore::new();
        let bucket = EscrowBucket::new();

        let first = bucket.create(&mut db, record("a")).unwrap();
        let second = bucket.create(&mut db, record("b")).unwrap();
        assert_eq!(first.id(), 1u64.to_be_bytes());
        assert_eq!(second.id(), 2u64.to_be_bytes());

        // Deletion never frees an id for reuse.
        bucket.delete(&mut db, first.id()).unwrap();
        let third = bucket.create(&mut db, record("c")).unwrap();
        assert_eq!(third.id(), 3u64.to_be_bytes());
    }

    #[test]
    fn test_get_roundtrip() {
        let mut db = MemStore::new();
        let bucket = EscrowBucket::new();

        let created = bucket.create(&mut db, record("deal")).unwrap();
        let loaded = bucket.get(&db, created.id()).unwrap().unwrap();
        assert_eq!(loaded, created);

        assert!(bucket.get(&db, &99u64.to_be_bytes()).unwrap().is_none());
    }

    #[test]
    fn test_save_requires_existing_record() {
        let mut db = MemStore::new();
        let bucket = EscrowBucket::new();

        let ghost = EscrowObject::new(7u64.to_be_bytes().to_vec(), record("x"));
        let err = bucket.save(&mut db, &ghost).unwrap_err();
        assert!(matches!(err, HandlerError::NoSuchEscrow(_)));

        let mut obj = bucket.create(&mut db, record("x")).unwrap();
        obj.escrow.memo = "updated".into();
        bucket.save(&mut db, &obj).unwrap();
        let loaded = bucket.get(&db, obj.id()).unwrap().unwrap();
        assert_eq!(loaded.escrow.memo, "updated");
    }

    #[test]
    fn test_delete_is_strict() {
        let mut db = MemStore::new();
        let bucket = EscrowBucket::new();

        let obj = bucket.create(&mut db, record("x")).unwrap();
        bucket.delete(&mut db, obj.id()).unwrap();

        let err = bucket.delete(&mut db, obj.id()).unwrap_err();
        assert!(matches!(err, HandlerError::NoSuchEscrow(_)));
    }

    #[test]
    fn test_query_iterates_records_not_sequence() {
        let mut db = MemStore::new();
        let bucket = EscrowBucket::new();
        bucket.create(&mut db, record("a")).unwrap();
        bucket.create(&mut db, record("b")).unwrap();

        let mut query_router = QueryRouter::new();
        bucket.register("escrows", &mut query_router);

        let all = query_router.query(&db, "escrows", &[]).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|m| m.key != SEQ_KEY));

        let one = query_router
            .query(&db, "escrows", &1u64.to_be_bytes())
            .unwrap();
        assert_eq!(one.len(), 1);

        let none = query_router
            .query(&db, "escrows", &9u64.to_be_bytes())
            .unwrap();
        assert!(none.is_empty());
    }
}
