//! `noop` store: stands in for the database when it is unreachable.
//!
//! Every write succeeds and is discarded; every read returns nothing.
//! Callers see the same `Ok` shapes as with a real store, so handlers need
//! no special casing for degraded mode.

use super::super::store::{StatusRecord, StatusStore, StoreError};

#[derive(Debug, Default)]
pub struct NoopStatusStore;

impl StatusStore for NoopStatusStore {
    fn store_type(&self) -> &str {
        "noop"
    }

    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert(&self, _record: &StatusRecord) -> Result<(), StoreError> {
        Ok(())
    }

    fn list(&self, _limit: usize) -> Result<Vec<StatusRecord>, StoreError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_vanish() {
        let store = NoopStatusStore;
        store.insert(&StatusRecord::new("alice")).unwrap();
        store.insert(&StatusRecord::new("bob")).unwrap();
        assert!(store.list(1000).unwrap().is_empty());
    }

    #[test]
    fn store_type_is_noop() {
        assert_eq!(NoopStatusStore.store_type(), "noop");
        assert!(NoopStatusStore.ping().is_ok());
    }
}
