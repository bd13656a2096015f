use acad_certs::certs::{CertificateFilter, CertificateRegistry};
use acad_certs::config::{Config, StoreBackend};
use acad_certs::{CertificateStore, NotFound, RegistryError, SqliteStore};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

async fn seeded_store() -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    for user in [1, 7] {
        store.insert_user(user, &format!("user-{user}")).await.unwrap();
    }
    for course in [3, 4] {
        store.insert_course(course, &format!("course-{course}")).await.unwrap();
    }
    Arc::new(store)
}

fn registry_over(store: &Arc<SqliteStore>) -> CertificateRegistry {
    let config = Config::default();
    CertificateRegistry::from_config(&config.registry, store.clone(), store.clone())
}

#[tokio::test]
async fn issue_and_validate_against_sqlite() {
    let store = seeded_store().await;
    let registry = registry_over(&store);

    let mut codes = HashSet::new();
    for _ in 0..3 {
        let rec = assert_ok!(registry.issue(7, 3).await);
        assert!(codes.insert(rec.validation_code.clone()));

        let found = assert_ok!(registry.validate(&rec.validation_code).await);
        assert_eq!(found, rec);
    }

    assert_eq!(registry.count_by_user(7).await.unwrap(), 3);
    assert_eq!(registry.list_by_course(3).await.unwrap().len(), 3);
    assert_eq!(registry.list_by_user_and_course(7, 4).await.unwrap().len(), 0);
}

#[tokio::test]
async fn unknown_entities_leave_no_rows() {
    let store = seeded_store().await;
    let registry = registry_over(&store);

    let err = assert_err!(registry.issue(2, 3).await);
    assert!(matches!(err, RegistryError::NotFound(NotFound::User(2))));

    let err = assert_err!(registry.issue(1, 5).await);
    assert!(matches!(err, RegistryError::NotFound(NotFound::Course(5))));

    assert_eq!(store.count(CertificateFilter::all()).await.unwrap(), 0);

    let err = assert_err!(registry.validate("does-not-exist").await);
    assert!(matches!(err, RegistryError::NotFound(NotFound::Certificate)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_issuance_keeps_codes_unique() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("certs.db")).await.unwrap();
    store.insert_user(1, "ada").await.unwrap();
    store.insert_course(1, "compilers").await.unwrap();
    let store = Arc::new(store);
    let registry = Arc::new(registry_over(&store));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.issue(1, 1).await })
        })
        .collect();

    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }

    let all = store.list(CertificateFilter::all()).await.unwrap();
    assert_eq!(all.len(), 50);
    let codes: HashSet<_> = all.iter().map(|r| r.validation_code.as_str()).collect();
    assert_eq!(codes.len(), 50);
    assert_eq!(registry.count_by_course(1).await.unwrap(), 50);
}

#[test]
fn env_database_selects_sqlite() {
    let mut config = Config::default();
    config
        .apply_env(|k| (k == "ACAD_CERTS_DB").then(|| ":memory:".to_string()))
        .unwrap();
    assert_eq!(config.store.backend, StoreBackend::Sqlite);
    assert!(config.validate().is_ok());
}
