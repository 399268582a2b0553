use crate::utils::errors::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// A directory record: an ID plus named binary attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryEntry {
    pub id: String,
    pub fields: BTreeMap<String, Vec<u8>>,
}

impl DirectoryEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&[u8]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    pub fn take_field(&mut self, name: &str) -> Option<Vec<u8>> {
        self.fields.remove(name)
    }
}

/// Key-value directory holding one entry per ID.
///
/// Each call is atomic per key: readers see either the previous entry or the
/// complete new one. `get` and `delete` fail with `EntryNotFound` when the ID
/// has no entry.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Create or replace the entry stored under `entry.id`
    async fn put(&self, entry: DirectoryEntry) -> Result<()>;

    async fn get(&self, id: &str) -> Result<DirectoryEntry>;

    async fn exists(&self, id: &str) -> Result<bool>;

    async fn delete(&self, id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_fields() {
        let mut entry = DirectoryEntry::new("alice")
            .with_field("a", b"one".to_vec())
            .with_field("b", vec![2u8]);

        assert_eq!(entry.field("a"), Some(&b"one"[..]));
        assert_eq!(entry.field("missing"), None);
        assert_eq!(entry.take_field("b"), Some(vec![2u8]));
        assert_eq!(entry.field("b"), None);
    }
}
