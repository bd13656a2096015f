//! Certificate registry for an academic-events platform.
//!
//! Issues certificates for (user, course) pairs, each carrying a unique
//! high-entropy validation code, and verifies certificates by that code.

pub mod certs;
pub mod config;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod store;

pub use certs::{CertificateFilter, CertificateRecord, CertificateRegistry};
pub use config::Config;
pub use directory::{EntityDirectory, InMemoryDirectory};
pub use error::{ConfigError, NotFound, RegistryError, StoreError};
pub use store::{CertificateStore, MemoryStore, SqliteStore};
