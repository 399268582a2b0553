use crate::cert::certificate::UserCertificate;
use crate::cert::generate::CertificateGenerator;
use crate::cert::metadata::CertificateMetadata;
use crate::config::{DeletePolicy, ServiceConfig};
use crate::crypto::keystore::{KeystoreCodec, Pkcs12Codec, UserKeystore};
use crate::storage::directory::Directory;
use crate::storage::local::FileDirectory;
use crate::storage::metadata::CertificateEntry;
use crate::storage::store::CertificateDirectoryStore;
use crate::user::info::{UserInfo, UserProfile};
use crate::user::profile::{load_profiles_file, UserProfileResolver};
use crate::utils::errors::{CertError, Result, ServiceError, ServiceResult};
use std::sync::Arc;

/// A user's certificate as returned to callers
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateDocument {
    pub user_id: String,
    pub certificate: UserCertificate,
    pub metadata: CertificateMetadata,
}

impl CertificateDocument {
    pub fn new(user_id: impl Into<String>, certificate: UserCertificate) -> Result<Self> {
        let metadata = certificate.metadata()?;
        Ok(Self {
            user_id: user_id.into(),
            certificate,
            metadata,
        })
    }
}

/// Per-user certificate and keystore lifecycle.
///
/// Each user ID is either absent or has exactly one entry holding the
/// password-protected keystore and a public copy of its leaf certificate.
/// `create_cert` writes that entry with a single directory call, so a
/// failure at any earlier step leaves the directory untouched.
pub struct CertUserService {
    generator: Arc<dyn CertificateGenerator>,
    codec: Arc<dyn KeystoreCodec>,
    store: CertificateDirectoryStore,
    profiles: Arc<dyn UserProfileResolver>,
    organization: Option<String>,
    delete_policy: DeletePolicy,
}

impl CertUserService {
    pub fn new(
        generator: Arc<dyn CertificateGenerator>,
        codec: Arc<dyn KeystoreCodec>,
        directory: Arc<dyn Directory>,
        profiles: Arc<dyn UserProfileResolver>,
    ) -> Self {
        Self {
            generator,
            codec,
            store: CertificateDirectoryStore::new(directory),
            profiles,
            organization: None,
            delete_policy: DeletePolicy::default(),
        }
    }

    /// File-backed service with PKCS#12 keystores, built from configuration
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;
        let generator = config.generator()?;
        let directory = FileDirectory::open(config.directory_path()?)?;
        let profiles = load_profiles_file(config.profiles_path()?)?;

        let mut service = Self::new(
            Arc::new(generator),
            Arc::new(Pkcs12Codec::new()),
            Arc::new(directory),
            Arc::new(profiles),
        )
        .with_delete_policy(config.delete_policy);
        service.organization = config.organization.clone();
        Ok(service)
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Issue a new key pair and certificate for `user`, replacing any existing entry
    pub async fn create_cert(&self, user: &str, password: &str) -> ServiceResult<CertificateDocument> {
        let profile = self
            .profiles
            .resolve(user)
            .await
            .map_err(ServiceError::client)?;
        let info = self.get_user_info(&profile)?;

        let credentials = self.generator.generate(&info).map_err(ServiceError::cert)?;
        let keystore =
            UserKeystore::from_credentials(&info.user_id, credentials).map_err(ServiceError::cert)?;
        let encoded = self
            .codec
            .encode(&keystore, password)
            .map_err(ServiceError::cert)?;

        let certificate = keystore.certificate().clone();
        let entry = CertificateEntry::new(&info.user_id, encoded, certificate.der().to_vec());
        self.store.put(entry).await.map_err(ServiceError::client)?;

        let document =
            CertificateDocument::new(&info.user_id, certificate).map_err(ServiceError::cert)?;
        tracing::info!(
            "Created certificate {} for user {}",
            document.metadata.serial,
            info.user_id
        );
        Ok(document)
    }

    /// Subject attributes for `profile`, with the configured organization
    pub fn get_user_info(&self, profile: &UserProfile) -> ServiceResult<UserInfo> {
        UserInfo::from_profile(profile, self.organization.as_deref()).map_err(ServiceError::cert)
    }

    /// Human-readable summary of the certificate in the user's keystore
    pub async fn get_user_cert_info(&self, user_id: &str, password: &str) -> ServiceResult<String> {
        let keystore = self.open_keystore(user_id, password).await?;
        let metadata = keystore
            .certificate()
            .metadata()
            .map_err(ServiceError::cert)?;
        Ok(metadata.to_string())
    }

    pub async fn get_user_keystore(
        &self,
        user_id: &str,
        password: &str,
    ) -> ServiceResult<UserKeystore> {
        self.open_keystore(user_id, password).await
    }

    /// The user's certificate; needs no password
    pub async fn get_certificate(&self, user_id: &str) -> ServiceResult<CertificateDocument> {
        let der = self.store.get_certificate(user_id).await?;
        let certificate = UserCertificate::from_der(der).map_err(ServiceError::cert)?;
        CertificateDocument::new(user_id, certificate).map_err(ServiceError::cert)
    }

    pub async fn has_certificate_entry(&self, user_id: &str) -> ServiceResult<bool> {
        self.store.exists(user_id).await.map_err(ServiceError::cert)
    }

    /// Remove the user's entry, and with it the keystore, key and certificate
    pub async fn delete_certificate_entry(&self, user_id: &str) -> ServiceResult<()> {
        match self.store.delete(user_id).await {
            Ok(()) => {
                tracing::info!("Deleted certificate entry for user {user_id}");
                Ok(())
            }
            Err(CertError::EntryNotFound(id)) => match self.delete_policy {
                DeletePolicy::Idempotent => {
                    tracing::debug!("No certificate entry for user {id}, nothing to delete");
                    Ok(())
                }
                DeletePolicy::Strict => Err(ServiceError::cert(CertError::EntryNotFound(id))),
            },
            Err(e) => Err(ServiceError::client(e)),
        }
    }

    /// Stored PKCS#12 bytes, still protected by the user's password
    pub async fn export_keystore(&self, user_id: &str) -> ServiceResult<Vec<u8>> {
        let entry = self.store.get(user_id).await?;
        Ok(entry.keystore)
    }

    async fn open_keystore(&self, user_id: &str, password: &str) -> ServiceResult<UserKeystore> {
        let entry = self.store.get(user_id).await.map_err(|e| match e {
            CertError::EntryNotFound(_) => ServiceError::cert(e),
            other => ServiceError::from(other),
        })?;

        let keystore = self
            .codec
            .decode(user_id, &entry.keystore, password)
            .map_err(|e| {
                tracing::warn!("Failed to open keystore for user {user_id}: {e}");
                ServiceError::cert(e)
            })?;

        if keystore.certificate().der() != entry.certificate.as_slice() {
            tracing::warn!("Keystore for user {user_id} does not hold the stored certificate");
            return Err(ServiceError::cert(CertError::CorruptKeystore(
                "keystore certificate differs from the entry certificate".to_string(),
            )));
        }
        Ok(keystore)
    }
}
