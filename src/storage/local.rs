use crate::storage::directory::{Directory, DirectoryEntry};
use crate::utils::errors::{CertError, Result};
use crate::utils::paths::{write_secure_file, UserCertPaths};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// On-disk form of one directory entry
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    id: String,
    updated: DateTime<Utc>,
    fields: BTreeMap<String, String>,
}

/// Directory backed by one YAML file per entry.
///
/// File names are the hex SHA-256 of the entry ID, so IDs of any length map
/// to a single file inside the base directory. The file records the ID
/// itself. Writes land in a temporary file that is renamed over the target.
#[derive(Debug, Clone)]
pub struct FileDirectory {
    base_dir: PathBuf,
}

impl FileDirectory {
    pub fn open<P: Into<PathBuf>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.into();
        UserCertPaths::ensure_dir_exists(&base_dir)?;
        tracing::debug!("Opened file directory at {}", base_dir.display());
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.yaml", file_stem(id)))
    }

    fn temp_path(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!(
            ".{}.{:016x}.tmp",
            file_stem(id),
            rand::random::<u64>()
        ))
    }

    fn write_atomic(&self, id: &str, contents: &str) -> Result<()> {
        let temp = self.temp_path(id);
        let result = write_secure_file(&temp, contents.as_bytes())
            .and_then(|_| fs::rename(&temp, self.entry_path(id)).map_err(CertError::from));

        if let Err(e) = result {
            let _ = fs::remove_file(&temp);
            return Err(CertError::DirectoryFailure(format!(
                "failed to write entry {id}: {e}"
            )));
        }
        Ok(())
    }
}

fn file_stem(id: &str) -> String {
    hex::encode(Sha256::digest(id.as_bytes()))
}

#[async_trait]
impl Directory for FileDirectory {
    async fn put(&self, entry: DirectoryEntry) -> Result<()> {
        let stored = StoredEntry {
            id: entry.id.clone(),
            updated: Utc::now(),
            fields: entry
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), BASE64.encode(value)))
                .collect(),
        };
        let yaml = serde_yaml::to_string(&stored)?;
        self.write_atomic(&entry.id, &yaml)?;

        tracing::debug!("Stored directory entry {}", entry.id);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<DirectoryEntry> {
        let path = self.entry_path(id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CertError::EntryNotFound(id.to_string()));
            }
            Err(e) => {
                return Err(CertError::DirectoryFailure(format!(
                    "failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        let stored: StoredEntry = serde_yaml::from_str(&contents).map_err(|e| {
            CertError::DirectoryFailure(format!("malformed entry {}: {e}", path.display()))
        })?;
        if stored.id != id {
            return Err(CertError::DirectoryFailure(format!(
                "entry {} holds ID {}",
                path.display(),
                stored.id
            )));
        }

        let mut entry = DirectoryEntry::new(stored.id);
        for (name, value) in stored.fields {
            let bytes = BASE64.decode(value.as_bytes()).map_err(|e| {
                CertError::DirectoryFailure(format!("field {name} of entry {id}: {e}"))
            })?;
            entry.fields.insert(name, bytes);
        }

        tracing::trace!("Loaded directory entry {id} (updated {})", stored.updated);
        Ok(entry)
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let path = self.entry_path(id);
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CertError::DirectoryFailure(format!(
                "failed to check {}: {e}",
                path.display()
            ))),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(id)) {
            Ok(()) => {
                tracing::debug!("Removed directory entry {id}");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(CertError::EntryNotFound(id.to_string()))
            }
            Err(e) => Err(CertError::DirectoryFailure(format!(
                "failed to delete entry {id}: {e}"
            ))),
        }
    }
}
