use crate::cert::generate::{CertificateAuthority, RcgenGenerator, DEFAULT_VALIDITY_YEARS};
use crate::utils::errors::{CertError, Result};
use crate::utils::paths::{expand_home, UserCertPaths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MAX_VALIDITY_YEARS: u32 = 30;

/// What deleting an absent certificate entry does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Succeed without touching the directory
    #[default]
    Idempotent,
    /// Fail with a not-found error
    Strict,
}

/// PEM files of the CA that signs user certificates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerConfig {
    pub certificate: String,
    pub private_key: String,
}

impl IssuerConfig {
    pub fn load(&self) -> Result<CertificateAuthority> {
        CertificateAuthority::load(expand_home(&self.certificate), expand_home(&self.private_key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Organization (O) placed in every subject
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default = "default_validity_years")]
    pub validity_years: u32,
    #[serde(default)]
    pub delete_policy: DeletePolicy,
    /// Self-signed certificates when absent
    #[serde(default)]
    pub issuer: Option<IssuerConfig>,
    /// Storage directory; defaults to ~/.local/share/usercert-rs/directory
    #[serde(default)]
    pub directory: Option<String>,
    /// User profiles file; defaults to ~/.config/usercert-rs/profiles.yaml
    #[serde(default)]
    pub profiles: Option<String>,
}

fn default_validity_years() -> u32 {
    DEFAULT_VALIDITY_YEARS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            organization: None,
            validity_years: default_validity_years(),
            delete_policy: DeletePolicy::default(),
            issuer: None,
            directory: None,
            profiles: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| CertError::Config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::from_yaml(&contents)
    }

    pub fn load_default() -> Result<Self> {
        Self::load(UserCertPaths::config_file()?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_VALIDITY_YEARS).contains(&self.validity_years) {
            return Err(CertError::Config(format!(
                "validity_years must be between 1 and {MAX_VALIDITY_YEARS}, got {}",
                self.validity_years
            )));
        }
        if let Some(org) = &self.organization {
            if org.trim().is_empty() {
                return Err(CertError::Config(
                    "organization must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn directory_path(&self) -> Result<PathBuf> {
        match &self.directory {
            Some(dir) => Ok(expand_home(dir)),
            None => UserCertPaths::directory_dir(),
        }
    }

    pub fn profiles_path(&self) -> Result<PathBuf> {
        match &self.profiles {
            Some(file) => Ok(expand_home(file)),
            None => UserCertPaths::profiles_file(),
        }
    }

    /// Certificate generator for this configuration, loading the CA if one is set
    pub fn generator(&self) -> Result<RcgenGenerator> {
        let generator = RcgenGenerator::new(self.validity_years);
        match &self.issuer {
            Some(issuer) => Ok(generator.with_authority(issuer.load()?)),
            None => Ok(generator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.validity_years, 2);
        assert_eq!(config.delete_policy, DeletePolicy::Idempotent);
        assert!(config.issuer.is_none());
        assert!(config.generator().unwrap().is_self_signing());
    }

    #[test]
    fn test_parse_yaml() {
        let config = ServiceConfig::from_yaml(
            r#"
organization: Example Corp
validity_years: 5
delete_policy: strict
directory: /srv/usercert
issuer:
  certificate: /etc/usercert/ca.pem
  private_key: /etc/usercert/ca.key
"#,
        )
        .unwrap();

        assert_eq!(config.organization.as_deref(), Some("Example Corp"));
        assert_eq!(config.validity_years, 5);
        assert_eq!(config.delete_policy, DeletePolicy::Strict);
        assert_eq!(
            config.directory_path().unwrap(),
            PathBuf::from("/srv/usercert")
        );
        assert_eq!(
            config.issuer.unwrap().private_key,
            "/etc/usercert/ca.key".to_string()
        );
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = ServiceConfig::from_yaml("organization: Acme\n").unwrap();
        assert_eq!(config.validity_years, DEFAULT_VALIDITY_YEARS);
        assert_eq!(config.delete_policy, DeletePolicy::Idempotent);
    }

    #[test]
    fn test_rejects_invalid_values() {
        for yaml in [
            "validity_years: 0\n",
            "validity_years: 31\n",
            "organization: '  '\n",
            "delete_policy: sometimes\n",
            "unknown_field: 1\n",
        ] {
            assert!(
                matches!(ServiceConfig::from_yaml(yaml), Err(CertError::Config(_))),
                "accepted {yaml:?}"
            );
        }
    }

    #[test]
    fn test_missing_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ServiceConfig::load(tmp.path().join("absent.yaml")).unwrap();
        assert_eq!(config, ServiceConfig::default());

        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "validity_years: 10\n").unwrap();
        assert_eq!(ServiceConfig::load(&path).unwrap().validity_years, 10);
    }

    #[test]
    fn test_missing_issuer_files() {
        let config = ServiceConfig {
            issuer: Some(IssuerConfig {
                certificate: "/nonexistent/ca.pem".to_string(),
                private_key: "/nonexistent/ca.key".to_string(),
            }),
            ..Default::default()
        };
        assert!(config.generator().is_err());
    }
}
