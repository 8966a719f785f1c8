//! Mock implementations for testing.

use async_trait::async_trait;
use chrono::Utc;
use clickhouse_client::RecordStore;
use parking_lot::Mutex;
use std::sync::Arc;
use utm_core::{AttributionRecord, Error, NewRecord, Result};
use uuid::Uuid;

/// In-memory record store.
///
/// Implements the same `RecordStore` trait as the ClickHouse client, so the
/// router runs its production code paths without a database.
#[derive(Clone)]
pub struct MockStore {
    records: Arc<Mutex<Vec<AttributionRecord>>>,
    /// Simulate failures if set.
    should_fail: Arc<Mutex<bool>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Start with the given records already stored.
    pub fn with_records(records: Vec<AttributionRecord>) -> Self {
        let store = Self::new();
        store.records.lock().extend(records);
        store
    }

    /// All stored records, in insertion order.
    pub fn stored(&self) -> Vec<AttributionRecord> {
        self.records.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().len()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    fn check(&self) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(Error::store("Mock store failure"));
        }
        Ok(())
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn insert(&self, record: NewRecord) -> Result<AttributionRecord> {
        self.check()?;
        let stored = AttributionRecord::from_new(Uuid::new_v4().to_string(), record, Utc::now());
        self.records.lock().push(stored.clone());
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<AttributionRecord>> {
        self.check()?;
        let mut records = self.stored();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn is_healthy(&self) -> bool {
        !*self.should_fail.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn test_mock_store_assigns_ids() {
        let store = MockStore::new();
        let stored = store
            .insert(NewRecord {
                utm_source: Some("google".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(stored.id.is_some());
        assert!(stored.created_at.is_some());
        assert_eq!(store.count(), 1);
        assert_eq!(store.stored()[0].utm_source.as_deref(), Some("google"));
    }

    #[tokio::test]
    async fn test_mock_store_lists_newest_first() {
        let store = MockStore::with_records(vec![
            fixtures::stored("web", "email", "spring", None, (2024, 3, 1)),
            fixtures::stored("ads", "cpc", "spring", None, (2024, 3, 5)),
        ]);

        let listed = store.list_all().await.unwrap();
        assert_eq!(listed[0].utm_source.as_deref(), Some("ads"));
        assert_eq!(listed[1].utm_source.as_deref(), Some("web"));
    }

    #[tokio::test]
    async fn test_mock_store_failure_mode() {
        let store = MockStore::new();
        store.set_should_fail(true);

        assert!(!store.is_healthy());
        let err = store.list_all().await.unwrap_err();
        assert_eq!(err.error_code(), Some("DB_001"));
        assert!(store.insert(NewRecord::default()).await.is_err());
        assert_eq!(store.count(), 0);

        store.set_should_fail(false);
        assert!(store.is_healthy());
    }
}
