use super::cache::ValidationCache;
use super::code::{CodeSource, RandomCodes, fingerprint};
use super::record::{
    CertificateFilter, CertificateId, CertificateRecord, CourseId, NewCertificate, UserId,
};
use crate::config::RegistryConfig;
use crate::directory::EntityDirectory;
use crate::error::{NotFound, RegistryError, StoreError};
use crate::metrics::RegistryMetrics;
use crate::store::CertificateStore;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::num::NonZeroUsize;
use std::sync::Arc;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Issues certificates and looks them up by validation code.
///
/// The registry keeps no domain state of its own. Code uniqueness is enforced
/// by the store; a rejected insert is retried here with a fresh code.
pub struct CertificateRegistry {
    store: Arc<dyn CertificateStore>,
    directory: Arc<dyn EntityDirectory>,
    codes: Arc<dyn CodeSource>,
    cache: Option<ValidationCache>,
    metrics: RegistryMetrics,
    max_attempts: u32,
}

impl CertificateRegistry {
    pub fn new(store: Arc<dyn CertificateStore>, directory: Arc<dyn EntityDirectory>) -> Self {
        Self {
            store,
            directory,
            codes: Arc::new(RandomCodes::default()),
            cache: None,
            metrics: RegistryMetrics::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Build from validated configuration: code format, retry bound and cache size.
    pub fn from_config(
        config: &RegistryConfig,
        store: Arc<dyn CertificateStore>,
        directory: Arc<dyn EntityDirectory>,
    ) -> Self {
        let registry = Self::new(store, directory)
            .with_code_source(Arc::new(RandomCodes::new(config.code_format())))
            .with_max_attempts(config.max_issue_attempts);

        match NonZeroUsize::new(config.cache_capacity) {
            Some(capacity) => registry.with_cache(capacity),
            None => registry,
        }
    }

    pub fn with_code_source(mut self, codes: Arc<dyn CodeSource>) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_cache(mut self, capacity: NonZeroUsize) -> Self {
        self.cache = Some(ValidationCache::new(capacity));
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn metrics(&self) -> &RegistryMetrics {
        &self.metrics
    }

    pub async fn issue(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CertificateRecord, RegistryError> {
        if !self.directory.user_exists(user_id).await? {
            return Err(NotFound::User(user_id).into());
        }
        if !self.directory.course_exists(course_id).await? {
            return Err(NotFound::Course(course_id).into());
        }

        let issued_on = Utc::now().date_naive();

        for attempt in 1..=self.max_attempts {
            let code = self.codes.next_code();
            let new = NewCertificate {
                user_id,
                course_id,
                issued_on,
                validation_code: &code,
            };

            match self.store.insert(&new).await {
                Ok(record) => {
                    self.metrics.record_issued();
                    info!(
                        "certificate {} issued: user={} course={} code={}",
                        record.id,
                        user_id,
                        course_id,
                        fingerprint(&record.validation_code)
                    );
                    return Ok(record);
                }
                Err(StoreError::DuplicateCode(fp)) => {
                    self.metrics.record_collision();
                    warn!(
                        "validation code collision ({}) on attempt {}/{}, regenerating",
                        fp, attempt, self.max_attempts
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.metrics.record_issuance_failure();
        error!(
            "gave up issuing certificate for user={} course={} after {} code collisions",
            user_id, course_id, self.max_attempts
        );
        Err(RegistryError::IssuanceFailed {
            attempts: self.max_attempts,
        })
    }

    /// Look up a certificate by the code printed on it.
    ///
    /// Surrounding whitespace is stripped; nothing else is normalized, so the
    /// match is exact and case-sensitive.
    pub async fn validate(&self, code: &str) -> Result<CertificateRecord, RegistryError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(RegistryError::InvalidInput(
                "validation code must not be empty".into(),
            ));
        }

        if let Some(cache) = &self.cache {
            let cached = cache.get(code).await;
            self.metrics.record_cache(cached.is_some());
            if let Some(record) = cached {
                self.metrics.record_validation(true);
                debug!("validation cache hit for {}", fingerprint(code));
                return Ok(record);
            }
        }

        let found = self.store.get_by_code(code).await?;
        self.metrics.record_validation(found.is_some());

        match found {
            Some(record) => {
                if let Some(cache) = &self.cache {
                    cache.put(&record).await;
                }
                debug!("validated certificate {} ({})", record.id, fingerprint(code));
                Ok(record)
            }
            None => {
                debug!("unknown validation code {}", fingerprint(code));
                Err(NotFound::Certificate.into())
            }
        }
    }

    pub async fn get(&self, id: CertificateId) -> Result<CertificateRecord, RegistryError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| NotFound::Certificate.into())
    }

    pub async fn list_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<CertificateRecord>, RegistryError> {
        Ok(self.store.list(CertificateFilter::by_user(user_id)).await?)
    }

    pub async fn list_by_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<CertificateRecord>, RegistryError> {
        Ok(self.store.list(CertificateFilter::by_course(course_id)).await?)
    }

    pub async fn list_by_user_and_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<CertificateRecord>, RegistryError> {
        Ok(self
            .store
            .list(CertificateFilter::by_user_and_course(user_id, course_id))
            .await?)
    }

    pub async fn count_by_user(&self, user_id: UserId) -> Result<u64, RegistryError> {
        Ok(self.store.count(CertificateFilter::by_user(user_id)).await?)
    }

    pub async fn count_by_course(&self, course_id: CourseId) -> Result<u64, RegistryError> {
        Ok(self.store.count(CertificateFilter::by_course(course_id)).await?)
    }

    pub async fn count_by_user_and_course(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<u64, RegistryError> {
        Ok(self
            .store
            .count(CertificateFilter::by_user_and_course(user_id, course_id))
            .await?)
    }

    /// Whether the user already holds at least one certificate for the course.
    pub async fn has_certificate(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<bool, RegistryError> {
        Ok(self.count_by_user_and_course(user_id, course_id).await? > 0)
    }

    pub async fn total_issued(&self) -> Result<u64, RegistryError> {
        Ok(self.store.count(CertificateFilter::all()).await?)
    }
}
