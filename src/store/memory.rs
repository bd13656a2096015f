use super::CertificateStore;
use crate::certs::{
    CertificateFilter, CertificateId, CertificateRecord, NewCertificate, fingerprint,
};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    next_id: CertificateId,
    records: BTreeMap<CertificateId, CertificateRecord>,
    by_code: HashMap<String, CertificateId>,
}

/// Process-local store. The code check and the write happen under one write
/// lock, so two concurrent inserts can never both claim a code.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CertificateStore for MemoryStore {
    async fn insert(&self, new: &NewCertificate<'_>) -> Result<CertificateRecord, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.by_code.contains_key(new.validation_code) {
            return Err(StoreError::DuplicateCode(fingerprint(new.validation_code)));
        }

        tables.next_id += 1;
        let record = new.into_record(tables.next_id);
        tables
            .by_code
            .insert(record.validation_code.clone(), record.id);
        tables.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: CertificateId) -> Result<Option<CertificateRecord>, StoreError> {
        Ok(self.tables.read().await.records.get(&id).cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<CertificateRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_code
            .get(code)
            .and_then(|id| tables.records.get(id))
            .cloned())
    }

    async fn list(&self, filter: CertificateFilter) -> Result<Vec<CertificateRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: CertificateFilter) -> Result<u64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.records.values().filter(|r| filter.matches(r)).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tokio_test::{assert_err, assert_ok};

    fn new_cert(user_id: i64, course_id: i64, code: &str) -> NewCertificate<'_> {
        NewCertificate {
            user_id,
            course_id,
            issued_on: NaiveDate::from_ymd_opt(2026, 5, 20).unwrap(),
            validation_code: code,
        }
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = assert_ok!(store.insert(&new_cert(1, 1, "AAAA-0001")).await);
        let b = assert_ok!(store.insert(&new_cert(1, 2, "AAAA-0002")).await);
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.get(2).await.unwrap(), Some(b));
        assert_eq!(store.get(3).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected_without_writing() {
        let store = MemoryStore::new();
        assert_ok!(store.insert(&new_cert(1, 1, "SAME-CODE")).await);

        let err = assert_err!(store.insert(&new_cert(2, 2, "SAME-CODE")).await);
        assert!(matches!(err, StoreError::DuplicateCode(_)));
        assert_eq!(store.count(CertificateFilter::all()).await.unwrap(), 1);
        assert_eq!(store.count(CertificateFilter::by_user(2)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn get_by_code_is_exact() {
        let store = MemoryStore::new();
        let rec = assert_ok!(store.insert(&new_cert(4, 9, "K7QX-22MZ")).await);

        assert_eq!(store.get_by_code("K7QX-22MZ").await.unwrap(), Some(rec));
        assert_eq!(store.get_by_code("k7qx-22mz").await.unwrap(), None);
        assert_eq!(store.get_by_code("K7QX22MZ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_and_count_follow_filter() {
        let store = MemoryStore::new();
        store.insert(&new_cert(7, 3, "C-1")).await.unwrap();
        store.insert(&new_cert(7, 4, "C-2")).await.unwrap();
        store.insert(&new_cert(8, 3, "C-3")).await.unwrap();
        store.insert(&new_cert(7, 3, "C-4")).await.unwrap();

        let by_user = store.list(CertificateFilter::by_user(7)).await.unwrap();
        let ids: Vec<_> = by_user.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);

        let pair = store
            .list(CertificateFilter::by_user_and_course(7, 3))
            .await
            .unwrap();
        assert_eq!(pair.len(), 2);

        assert_eq!(store.count(CertificateFilter::by_course(3)).await.unwrap(), 3);
        assert!(store.list(CertificateFilter::by_user(99)).await.unwrap().is_empty());
    }
}
