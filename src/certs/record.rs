use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type CertificateId = i64;
pub type UserId = i64;
pub type CourseId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CertificateRecord {
    pub id: CertificateId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub issued_on: NaiveDate,
    pub validation_code: String,
}

/// Insert parameters for a certificate. The store assigns the id.
#[derive(Debug, Clone, Copy)]
pub struct NewCertificate<'a> {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub issued_on: NaiveDate,
    pub validation_code: &'a str,
}

impl NewCertificate<'_> {
    pub fn into_record(self, id: CertificateId) -> CertificateRecord {
        CertificateRecord {
            id,
            user_id: self.user_id,
            course_id: self.course_id,
            issued_on: self.issued_on,
            validation_code: self.validation_code.to_string(),
        }
    }
}

/// Foreign-key filter for list and count queries. Absent fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CertificateFilter {
    pub user_id: Option<UserId>,
    pub course_id: Option<CourseId>,
}

impl CertificateFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            course_id: None,
        }
    }

    pub fn by_course(course_id: CourseId) -> Self {
        Self {
            user_id: None,
            course_id: Some(course_id),
        }
    }

    pub fn by_user_and_course(user_id: UserId, course_id: CourseId) -> Self {
        Self {
            user_id: Some(user_id),
            course_id: Some(course_id),
        }
    }

    pub fn matches(&self, record: &CertificateRecord) -> bool {
        self.user_id.is_none_or(|u| u == record.user_id)
            && self.course_id.is_none_or(|c| c == record.course_id)
    }
}
