pub mod cert;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod storage;
pub mod user;
pub mod utils;

// Re-export specific items to avoid conflicts
pub use cert::service::{CertUserService, CertificateDocument};
pub use cert::{CertificateAuthority, CertificateGenerator, RcgenGenerator, UserCertificate};
pub use cli::{args, commands};
pub use config::{DeletePolicy, ServiceConfig};
pub use crypto::{KeystoreCodec, Pkcs12Codec, UserKeyPair, UserKeystore};
pub use storage::{CertificateDirectoryStore, Directory, DirectoryEntry, FileDirectory, MemoryDirectory};
pub use user::{UserInfo, UserProfile, UserProfileResolver};
pub use utils::{errors, paths};
