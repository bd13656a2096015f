pub mod cache;
pub mod code;
pub mod record;
pub mod registry;

pub use cache::ValidationCache;
pub use code::{CodeFormat, CodeSource, RandomCodes, fingerprint};
pub use record::{
    CertificateFilter, CertificateId, CertificateRecord, CourseId, NewCertificate, UserId,
};
pub use registry::CertificateRegistry;
