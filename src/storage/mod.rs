pub mod directory;
pub mod local;
pub mod memory;
pub mod metadata;
pub mod store;

pub use directory::{Directory, DirectoryEntry};
pub use local::FileDirectory;
pub use memory::MemoryDirectory;
pub use metadata::CertificateEntry;
pub use store::CertificateDirectoryStore;
