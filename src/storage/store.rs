use crate::storage::directory::Directory;
use crate::storage::metadata::{CertificateEntry, FIELD_CERTIFICATE};
use crate::utils::errors::{CertError, Result};
use std::sync::Arc;

/// Typed access to certificate entries in a directory
#[derive(Clone)]
pub struct CertificateDirectoryStore {
    directory: Arc<dyn Directory>,
}

impl CertificateDirectoryStore {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Write the whole entry in a single directory call
    pub async fn put(&self, entry: CertificateEntry) -> Result<()> {
        let user_id = entry.user_id.clone();
        self.directory.put(entry.into_directory_entry()).await?;
        tracing::debug!("Saved certificate entry for {user_id}");
        Ok(())
    }

    pub async fn get(&self, user_id: &str) -> Result<CertificateEntry> {
        let raw = self.directory.get(user_id).await?;
        CertificateEntry::from_directory_entry(raw)
    }

    /// Only the public certificate field of the entry
    pub async fn get_certificate(&self, user_id: &str) -> Result<Vec<u8>> {
        let mut raw = self.directory.get(user_id).await?;
        raw.take_field(FIELD_CERTIFICATE).ok_or_else(|| {
            CertError::DirectoryFailure(format!(
                "entry {user_id} has no {FIELD_CERTIFICATE} field"
            ))
        })
    }

    pub async fn exists(&self, user_id: &str) -> Result<bool> {
        self.directory.exists(user_id).await
    }

    pub async fn delete(&self, user_id: &str) -> Result<()> {
        self.directory.delete(user_id).await?;
        tracing::debug!("Deleted certificate entry for {user_id}");
        Ok(())
    }
}
