pub mod certificate;
pub mod generate;
pub mod metadata;
pub mod parser;
pub mod serial;
pub mod service;

pub use certificate::UserCertificate;
pub use generate::{
    CertificateAuthority, CertificateGenerator, GeneratedCredentials, RcgenGenerator,
    DEFAULT_VALIDITY_YEARS,
};
pub use metadata::CertificateMetadata;
pub use parser::CertificateParser;
pub use serial::SerialNumber;
pub use service::{CertUserService, CertificateDocument};
