use crate::storage::directory::DirectoryEntry;
use crate::utils::errors::{CertError, Result};

pub const FIELD_USER_ID: &str = "userid";
pub const FIELD_KEYSTORE: &str = "keystore";
pub const FIELD_CERTIFICATE: &str = "certificate";

/// Directory record holding a user's encoded keystore and public certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateEntry {
    pub user_id: String,
    /// Password-protected PKCS#12 bytes
    pub keystore: Vec<u8>,
    /// DER of the leaf certificate inside `keystore`
    pub certificate: Vec<u8>,
}

impl CertificateEntry {
    pub fn new(user_id: impl Into<String>, keystore: Vec<u8>, certificate: Vec<u8>) -> Self {
        Self {
            user_id: user_id.into(),
            keystore,
            certificate,
        }
    }

    pub fn into_directory_entry(self) -> DirectoryEntry {
        DirectoryEntry::new(self.user_id.clone())
            .with_field(FIELD_USER_ID, self.user_id.into_bytes())
            .with_field(FIELD_KEYSTORE, self.keystore)
            .with_field(FIELD_CERTIFICATE, self.certificate)
    }

    pub fn from_directory_entry(mut entry: DirectoryEntry) -> Result<Self> {
        let keystore = take_required(&mut entry, FIELD_KEYSTORE)?;
        let certificate = take_required(&mut entry, FIELD_CERTIFICATE)?;
        if let Some(stored) = entry.field(FIELD_USER_ID) {
            if stored != entry.id.as_bytes() {
                return Err(CertError::DirectoryFailure(format!(
                    "entry {} carries a different {FIELD_USER_ID}",
                    entry.id
                )));
            }
        }

        Ok(Self {
            user_id: entry.id,
            keystore,
            certificate,
        })
    }
}

fn take_required(entry: &mut DirectoryEntry, name: &str) -> Result<Vec<u8>> {
    entry.take_field(name).ok_or_else(|| {
        CertError::DirectoryFailure(format!("entry {} has no {name} field", entry.id))
    })
}
