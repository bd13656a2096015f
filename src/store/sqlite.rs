//! SQLite-backed certificate store.

use super::CertificateStore;
use crate::certs::{
    CertificateFilter, CertificateId, CertificateRecord, CourseId, NewCertificate, UserId,
    fingerprint,
};
use crate::directory::EntityDirectory;
use crate::error::StoreError;
use async_trait::async_trait;
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS courses (
        id INTEGER PRIMARY KEY,
        title TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS certificates (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        course_id INTEGER NOT NULL,
        issued_on TEXT NOT NULL,
        validation_code TEXT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_certificates_code ON certificates (validation_code)",
    "CREATE INDEX IF NOT EXISTS idx_certificates_user ON certificates (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_certificates_course ON certificates (course_id)",
];

const FILTERED: &str = "(? IS NULL OR user_id = ?) AND (? IS NULL OR course_id = ?)";

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let options =
            SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))
                .map_err(|e| StoreError::Connection(e.to_string()))?
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!("certificate database opened at {}", path.display());

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    /// Single-connection in-memory database; it lives as long as the pool.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Register a user so the directory reports it as existing. Re-inserting is a no-op.
    pub async fn insert_user(&self, id: UserId, name: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO users (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_course(&self, id: CourseId, title: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR IGNORE INTO courses (id, title) VALUES (?, ?)")
            .bind(id)
            .bind(title)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn exists(&self, sql: &str, id: i64) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl CertificateStore for SqliteStore {
    async fn insert(&self, new: &NewCertificate<'_>) -> Result<CertificateRecord, StoreError> {
        let result = sqlx::query(
            "INSERT INTO certificates (user_id, course_id, issued_on, validation_code) VALUES (?, ?, ?, ?)",
        )
        .bind(new.user_id)
        .bind(new.course_id)
        .bind(new.issued_on)
        .bind(new.validation_code)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(new.into_record(done.last_insert_rowid())),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                StoreError::DuplicateCode(fingerprint(new.validation_code)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: CertificateId) -> Result<Option<CertificateRecord>, StoreError> {
        let record =
            sqlx::query_as::<_, CertificateRecord>("SELECT * FROM certificates WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(record)
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<CertificateRecord>, StoreError> {
        let record = sqlx::query_as::<_, CertificateRecord>(
            "SELECT * FROM certificates WHERE validation_code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list(&self, filter: CertificateFilter) -> Result<Vec<CertificateRecord>, StoreError> {
        let sql = format!("SELECT * FROM certificates WHERE {FILTERED} ORDER BY id");
        let records = sqlx::query_as::<_, CertificateRecord>(&sql)
            .bind(filter.user_id)
            .bind(filter.user_id)
            .bind(filter.course_id)
            .bind(filter.course_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn count(&self, filter: CertificateFilter) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM certificates WHERE {FILTERED}");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.user_id)
            .bind(filter.user_id)
            .bind(filter.course_id)
            .bind(filter.course_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl EntityDirectory for SqliteStore {
    async fn user_exists(&self, id: UserId) -> Result<bool, StoreError> {
        self.exists("SELECT id FROM users WHERE id = ?", id).await
    }

    async fn course_exists(&self, id: CourseId) -> Result<bool, StoreError> {
        self.exists("SELECT id FROM courses WHERE id = ?", id).await
    }
}
