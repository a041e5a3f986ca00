//! The last good snapshot, in memory and in the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dhv_core::StorageError;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::store::{SnapshotStore, SNAPSHOT_KEY};
use crate::types::ForecastSnapshot;

/// Holds the most recent successful snapshot.
///
/// Readers get an `Arc` and never observe a half-written value. Writes go to
/// the store first; the in-memory value only changes once that succeeded.
pub struct ForecastCache {
    store: Arc<dyn SnapshotStore>,
    current: RwLock<Option<Arc<ForecastSnapshot>>>,
    last_updated: RwLock<Option<DateTime<Utc>>>,
}

impl ForecastCache {
    /// Load whatever the store holds. Undecodable data counts as no data.
    pub fn open(store: Arc<dyn SnapshotStore>) -> Result<Self, StorageError> {
        let current = match store.read(SNAPSHOT_KEY)? {
            Some(json) => match ForecastSnapshot::from_json(&json) {
                Ok(snapshot) => {
                    debug!(regions = snapshot.regions().len(), "Loaded cached snapshot");
                    Some(Arc::new(snapshot))
                }
                Err(e) => {
                    warn!(error = %e, "Ignoring undecodable cached snapshot");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            store,
            current: RwLock::new(current),
            last_updated: RwLock::new(None),
        })
    }

    /// `None` until a snapshot has been stored.
    pub fn current(&self) -> Option<Arc<ForecastSnapshot>> {
        self.current.read().clone()
    }

    pub fn replace(&self, snapshot: ForecastSnapshot) -> Result<Arc<ForecastSnapshot>, StorageError> {
        let json = snapshot
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.write(SNAPSHOT_KEY, &json)?;

        let snapshot = Arc::new(snapshot);
        *self.current.write() = Some(Arc::clone(&snapshot));
        *self.last_updated.write() = Some(Utc::now());
        Ok(snapshot)
    }

    /// Time of the last successful `replace` in this process
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        *self.last_updated.read()
    }
}

impl std::fmt::Debug for ForecastCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastCache")
            .field("current", &self.current.read().as_ref().map(|s| s.regions().len()))
            .field("last_updated", &self.last_updated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{DayForecast, DayToken, RegionForecast, Status};

    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::QueryFailed("disk full".into()))
        }
    }

    fn snapshot() -> ForecastSnapshot {
        let day = DayForecast::new(
            DayToken::new("Mo 08.12.".into()),
            "Sonnig".into(),
            String::new(),
            Status::Good,
        );
        ForecastSnapshot::new(vec![RegionForecast::new("DE", vec![day]).unwrap()])
    }

    #[test]
    fn test_empty_store_means_no_data() {
        let cache = ForecastCache::open(Arc::new(MemoryStore::new())).unwrap();
        assert!(cache.current().is_none());
        assert!(cache.last_updated().is_none());
    }

    #[test]
    fn test_replace_writes_through() {
        let store = Arc::new(MemoryStore::new());
        let cache = ForecastCache::open(store.clone()).unwrap();
        cache.replace(snapshot()).unwrap();

        assert_eq!(cache.current().as_deref(), Some(&snapshot()));
        assert!(cache.last_updated().is_some());

        let reopened = ForecastCache::open(store).unwrap();
        assert_eq!(reopened.current().as_deref(), Some(&snapshot()));
    }

    #[test]
    fn test_failed_write_leaves_cache_untouched() {
        let cache = ForecastCache::open(Arc::new(BrokenStore)).unwrap();
        assert!(cache.replace(snapshot()).is_err());
        assert!(cache.current().is_none());
        assert!(cache.last_updated().is_none());
    }

    #[test]
    fn test_corrupt_data_is_no_data() {
        let store = Arc::new(MemoryStore::new());
        store.write(SNAPSHOT_KEY, "{not json").unwrap();
        let cache = ForecastCache::open(store).unwrap();
        assert!(cache.current().is_none());
    }

    #[test]
    fn test_data_breaking_invariants_is_no_data() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(
                SNAPSHOT_KEY,
                r#"{"regions":[{"regionName":"DE","days":[]},{"regionName":"NA","days":[{"date":"","summaryText":"x"}]}]}"#,
            )
            .unwrap();
        let cache = ForecastCache::open(store).unwrap();
        assert!(cache.current().is_none());
    }
}
