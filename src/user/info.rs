use crate::utils::errors::{CertError, Result};
use serde::{Deserialize, Serialize};

/// User document as supplied by the profile resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub organizational_unit: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            organizational_unit: None,
            email: None,
            locale: None,
        }
    }

    pub fn with_organizational_unit(mut self, unit: impl Into<String>) -> Self {
        self.organizational_unit = Some(unit.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// Attributes used to build a certificate subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: String,
    pub common_name: String,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub email: Option<String>,
    pub locale: Option<String>,
}

impl UserInfo {
    /// Project a profile into subject attributes, rejecting missing identity fields
    pub fn from_profile(profile: &UserProfile, organization: Option<&str>) -> Result<Self> {
        let user_id = profile.user_id.trim();
        if user_id.is_empty() {
            return Err(CertError::InvalidSubject(
                "missing user attribute: user_id".to_string(),
            ));
        }
        let common_name = profile.name.trim();
        if common_name.is_empty() {
            return Err(CertError::InvalidSubject(format!(
                "missing user attribute: name (user {user_id})"
            )));
        }

        Ok(Self {
            user_id: user_id.to_string(),
            common_name: common_name.to_string(),
            organization: non_empty(organization),
            organizational_unit: non_empty(profile.organizational_unit.as_deref()),
            email: non_empty(profile.email.as_deref()),
            locale: non_empty(profile.locale.as_deref()),
        })
    }

    /// Two-letter country code derived from the locale (`en_US`, `fr-CA`, `DE`)
    pub fn country(&self) -> Option<String> {
        let locale = self.locale.as_deref()?;
        let region = match locale.split(['_', '-']).nth(1) {
            Some(region) => region,
            None if locale.len() == 2 && locale.chars().all(|c| c.is_ascii_uppercase()) => locale,
            None => return None,
        };
        // Drop encoding/modifier suffixes such as `en_US.UTF-8`
        let region = region.split(['.', '@']).next().unwrap_or(region);
        if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(region.to_ascii_uppercase())
        } else {
            None
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
