use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertError {
    #[error("Invalid certificate subject: {0}")]
    InvalidSubject(String),

    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    #[error("Invalid keystore password")]
    InvalidPassword,

    #[error("Corrupt keystore: {0}")]
    CorruptKeystore(String),

    #[error("Keystore encoding error: {0}")]
    KeystoreEncoding(String),

    #[error("Certificate entry not found: {0}")]
    EntryNotFound(String),

    #[error("Directory failure: {0}")]
    DirectoryFailure(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Certificate parsing error: {0}")]
    CertParsing(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CertError>;

/// Caller-facing error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Cryptographic or subject-related failure
    Cert,
    /// Directory, profile or storage failure
    Client,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cert => write!(f, "certificate error"),
            Self::Client => write!(f, "client error"),
        }
    }
}

/// Error returned by the service facade, carrying the underlying cause
#[derive(Error, Debug)]
#[error("{kind}: {cause}")]
pub struct ServiceError {
    kind: ErrorKind,
    #[source]
    cause: CertError,
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn cert(cause: CertError) -> Self {
        Self {
            kind: ErrorKind::Cert,
            cause,
        }
    }

    pub fn client(cause: CertError) -> Self {
        Self {
            kind: ErrorKind::Client,
            cause,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn cause(&self) -> &CertError {
        &self.cause
    }

    pub fn into_cause(self) -> CertError {
        self.cause
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.cause, CertError::EntryNotFound(_))
    }

    pub fn is_invalid_password(&self) -> bool {
        matches!(self.cause, CertError::InvalidPassword)
    }
}

impl From<CertError> for ServiceError {
    fn from(cause: CertError) -> Self {
        match cause {
            CertError::EntryNotFound(_)
            | CertError::DirectoryFailure(_)
            | CertError::UnknownUser(_)
            | CertError::Config(_)
            | CertError::Io(_)
            | CertError::Yaml(_) => Self::client(cause),
            _ => Self::cert(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_classification() {
        let err: ServiceError = CertError::KeyGeneration("rng".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Cert);

        let err: ServiceError = CertError::DirectoryFailure("offline".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Client);

        let err: ServiceError = CertError::KeystoreEncoding("pbes2".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Cert);

        let err: ServiceError = CertError::InvalidPassword.into();
        assert_eq!(err.kind(), ErrorKind::Cert);
        assert!(err.is_invalid_password());
    }

    #[test]
    fn test_explicit_kind_keeps_cause() {
        let err = ServiceError::cert(CertError::EntryNotFound("alice".to_string()));
        assert_eq!(err.kind(), ErrorKind::Cert);
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "certificate error: Certificate entry not found: alice"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
