use crate::storage::directory::{Directory, DirectoryEntry};
use crate::utils::errors::{CertError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local directory, mainly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    entries: RwLock<HashMap<String, DirectoryEntry>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn put(&self, entry: DirectoryEntry) -> Result<()> {
        self.entries.write().await.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<DirectoryEntry> {
        self.entries
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CertError::EntryNotFound(id.to_string()))
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(id))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CertError::EntryNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let dir = MemoryDirectory::new();
        assert!(!dir.exists("bob").await.unwrap());

        let entry = DirectoryEntry::new("bob").with_field("k", b"v".to_vec());
        dir.put(entry.clone()).await.unwrap();
        assert!(dir.exists("bob").await.unwrap());
        assert_eq!(dir.get("bob").await.unwrap(), entry);
        assert_eq!(dir.len().await, 1);

        dir.delete("bob").await.unwrap();
        assert!(dir.is_empty().await);
        assert!(matches!(
            dir.get("bob").await,
            Err(CertError::EntryNotFound(_))
        ));
        assert!(matches!(
            dir.delete("bob").await,
            Err(CertError::EntryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = MemoryDirectory::new();
        dir.put(DirectoryEntry::new("x").with_field("k", b"1".to_vec()))
            .await
            .unwrap();
        dir.put(DirectoryEntry::new("x").with_field("k", b"2".to_vec()))
            .await
            .unwrap();
        assert_eq!(dir.get("x").await.unwrap().field("k"), Some(&b"2"[..]));
    }
}
