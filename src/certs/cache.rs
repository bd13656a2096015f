use super::record::CertificateRecord;
use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

/// LRU of validated certificates keyed by code.
///
/// Records are immutable and never deleted, so an entry can't go stale.
/// Only successful lookups are stored; unknown codes always reach the store.
pub struct ValidationCache {
    entries: Mutex<LruCache<String, CertificateRecord>>,
}

impl ValidationCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn get(&self, code: &str) -> Option<CertificateRecord> {
        self.entries.lock().await.get(code).cloned()
    }

    pub async fn put(&self, record: &CertificateRecord) {
        self.entries
            .lock()
            .await
            .put(record.validation_code.clone(), record.clone());
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: i64, code: &str) -> CertificateRecord {
        CertificateRecord {
            id,
            user_id: 1,
            course_id: 1,
            issued_on: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            validation_code: code.to_string(),
        }
    }

    #[tokio::test]
    async fn evicts_least_recently_used() {
        let cache = ValidationCache::new(NonZeroUsize::new(2).unwrap());
        cache.put(&record(1, "AAAA")).await;
        cache.put(&record(2, "BBBB")).await;

        // touch AAAA so BBBB becomes the eviction candidate
        assert_eq!(cache.get("AAAA").await.map(|r| r.id), Some(1));
        cache.put(&record(3, "CCCC")).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("BBBB").await.is_none());
        assert!(cache.get("AAAA").await.is_some());
        assert!(cache.get("CCCC").await.is_some());
    }
}
