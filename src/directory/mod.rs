//! User and course existence checks.
//!
//! Users and courses are owned by the wider platform. The registry only needs
//! to know whether an id refers to something real before it issues against it.

pub mod memory;

use crate::certs::{CourseId, UserId};
use crate::error::StoreError;
use async_trait::async_trait;

pub use memory::InMemoryDirectory;

#[async_trait]
pub trait EntityDirectory: Send + Sync {
    async fn user_exists(&self, id: UserId) -> Result<bool, StoreError>;
    async fn course_exists(&self, id: CourseId) -> Result<bool, StoreError>;
}
