use crate::user::info::UserProfile;
use crate::utils::errors::{CertError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Looks up the user document for an opaque user reference
#[async_trait]
pub trait UserProfileResolver: Send + Sync {
    async fn resolve(&self, user: &str) -> Result<UserProfile>;
}

/// Profiles held in memory, keyed by user ID
#[derive(Debug, Default, Clone)]
pub struct InMemoryProfiles {
    profiles: HashMap<String, UserProfile>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, profile: UserProfile) {
        self.profiles.insert(profile.user_id.clone(), profile);
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.insert(profile);
        self
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl UserProfileResolver for InMemoryProfiles {
    async fn resolve(&self, user: &str) -> Result<UserProfile> {
        self.profiles
            .get(user)
            .cloned()
            .ok_or_else(|| CertError::UnknownUser(user.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ProfilesFile {
    #[serde(default)]
    users: Vec<UserProfile>,
}

/// Load profiles from a YAML file of the form `users: [{user_id, name, ...}]`
pub fn load_profiles_file<P: AsRef<Path>>(path: P) -> Result<InMemoryProfiles> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::debug!("Profiles file {} not found, starting empty", path.display());
        return Ok(InMemoryProfiles::new());
    }

    let content = std::fs::read_to_string(path)?;
    let file: ProfilesFile = serde_yaml::from_str(&content)?;

    let mut profiles = InMemoryProfiles::new();
    for profile in file.users {
        if profiles.profiles.contains_key(&profile.user_id) {
            return Err(CertError::Config(format!(
                "Duplicate user '{}' in {}",
                profile.user_id,
                path.display()
            )));
        }
        profiles.insert(profile);
    }

    tracing::debug!(
        "Loaded {} user profiles from {}",
        profiles.len(),
        path.display()
    );
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_resolve() {
        let profiles = InMemoryProfiles::new().with_profile(UserProfile::new("alice", "Alice"));

        let profile = profiles.resolve("alice").await.unwrap();
        assert_eq!(profile.name, "Alice");
        assert!(matches!(
            profiles.resolve("mallory").await,
            Err(CertError::UnknownUser(_))
        ));
    }

    #[tokio::test]
    async fn test_load_profiles_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("profiles.yaml");
        std::fs::write(
            &path,
            "users:\n  - user_id: alice\n    name: Alice Liddell\n    email: alice@example.com\n    locale: en_GB\n  - user_id: bob\n    name: Bob\n",
        )
        .unwrap();

        let profiles = load_profiles_file(&path).unwrap();
        assert_eq!(profiles.len(), 2);
        let alice = profiles.resolve("alice").await.unwrap();
        assert_eq!(alice.email.as_deref(), Some("alice@example.com"));
        assert_eq!(alice.locale.as_deref(), Some("en_GB"));
        assert_eq!(profiles.resolve("bob").await.unwrap().email, None);
    }

    #[test]
    fn test_missing_file_is_empty_and_duplicates_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_profiles_file(tmp.path().join("none.yaml"))
            .unwrap()
            .is_empty());

        let path = tmp.path().join("dup.yaml");
        std::fs::write(
            &path,
            "users:\n  - user_id: a\n    name: A\n  - user_id: a\n    name: B\n",
        )
        .unwrap();
        assert!(matches!(
            load_profiles_file(&path),
            Err(CertError::Config(_))
        ));
    }
}
