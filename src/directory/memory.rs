use super::EntityDirectory;
use crate::certs::{CourseId, UserId};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashSet<UserId>>,
    courses: RwLock<HashSet<CourseId>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(
        users: impl IntoIterator<Item = UserId>,
        courses: impl IntoIterator<Item = CourseId>,
    ) -> Self {
        Self {
            users: RwLock::new(users.into_iter().collect()),
            courses: RwLock::new(courses.into_iter().collect()),
        }
    }

    pub async fn add_user(&self, id: UserId) {
        self.users.write().await.insert(id);
    }

    pub async fn add_course(&self, id: CourseId) {
        self.courses.write().await.insert(id);
    }
}

#[async_trait]
impl EntityDirectory for InMemoryDirectory {
    async fn user_exists(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self.users.read().await.contains(&id))
    }

    async fn course_exists(&self, id: CourseId) -> Result<bool, StoreError> {
        Ok(self.courses.read().await.contains(&id))
    }
}
