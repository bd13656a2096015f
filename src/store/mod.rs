//! Durable certificate storage.
//!
//! The store is the only shared mutable state in the registry, and it is the
//! store that guarantees validation codes are unique: an insert whose code is
//! already taken must fail with [`StoreError::DuplicateCode`] as part of the
//! same atomic step that would have written the row.

pub mod memory;
pub mod sqlite;

use crate::certs::{CertificateFilter, CertificateId, CertificateRecord, NewCertificate};
use crate::error::StoreError;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn insert(&self, new: &NewCertificate<'_>) -> Result<CertificateRecord, StoreError>;

    async fn get(&self, id: CertificateId) -> Result<Option<CertificateRecord>, StoreError>;

    async fn get_by_code(&self, code: &str) -> Result<Option<CertificateRecord>, StoreError>;

    /// Matching records in id (insertion) order.
    async fn list(&self, filter: CertificateFilter) -> Result<Vec<CertificateRecord>, StoreError>;

    async fn count(&self, filter: CertificateFilter) -> Result<u64, StoreError>;
}
