use crate::utils::errors::{CertError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct UserCertPaths;
pub const PROGRAM_NAME: &str = "usercert-rs";

impl UserCertPaths {
    /// Get the base data directory: ~/.local/share/usercert-rs/
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|dir| dir.join(PROGRAM_NAME))
            .ok_or_else(|| CertError::Config("Cannot determine local data directory".to_string()))
    }

    /// Get the config directory: ~/.config/usercert-rs/
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(PROGRAM_NAME))
            .ok_or_else(|| CertError::Config("Cannot determine config directory".to_string()))
    }

    /// Get the config file path: ~/.config/usercert-rs/config.yaml
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Get the user profiles file: ~/.config/usercert-rs/profiles.yaml
    pub fn profiles_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("profiles.yaml"))
    }

    /// Get the certificate directory storage: ~/.local/share/usercert-rs/directory/
    pub fn directory_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("directory"))
    }

    /// Ensure a directory exists with proper permissions
    pub fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;

            // Restrictive permissions on data directories (700)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mut perms = fs::metadata(path)?.permissions();
                perms.set_mode(0o700);
                fs::set_permissions(path, perms)?;
            }
        }
        Ok(())
    }
}

/// Restrict a file to owner read/write
pub fn set_secure_file_permissions<P: AsRef<Path>>(path: P) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path.as_ref())?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path.as_ref(), perms)?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Write `contents` to a file that is created owner read/write only
pub fn write_secure_file<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path.as_ref())?;
    // mode only applies on creation
    set_secure_file_permissions(path.as_ref())?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/etc/usercert"), PathBuf::from("/etc/usercert"));
        assert_eq!(expand_home("relative/dir"), PathBuf::from("relative/dir"));
    }

    #[test]
    fn test_ensure_dir_exists_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        UserCertPaths::ensure_dir_exists(&nested).unwrap();
        assert!(nested.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&nested).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }

    #[test]
    fn test_write_secure_file_restricts_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.p12");
        fs::write(&path, b"previous, longer contents").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        }

        write_secure_file(&path, b"pfx").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"pfx");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
