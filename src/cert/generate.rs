use crate::cert::certificate::UserCertificate;
use crate::cert::serial::SerialNumber;
use crate::crypto::keys::UserKeyPair;
use crate::user::UserInfo;
use crate::utils::errors::{CertError, Result};
use crate::utils::pem::parse_certificate_chain;
use rcgen::{
    Certificate, CertificateParams, DistinguishedName, DnType, DnValue, ExtendedKeyUsagePurpose,
    Ia5String, IsCa, KeyPair, KeyUsagePurpose, SanType, PKCS_ECDSA_P256_SHA256,
};
use std::path::Path;
use time::{Duration, OffsetDateTime};

/// pkcs-9 emailAddress
const OID_EMAIL_ADDRESS: &[u64] = &[1, 2, 840, 113549, 1, 9, 1];
/// RFC 4519 uid
const OID_USER_ID: &[u64] = &[0, 9, 2342, 19200300, 100, 1, 1];

pub const DEFAULT_VALIDITY_YEARS: u32 = 2;

/// Freshly generated key material for one user
#[derive(Debug)]
pub struct GeneratedCredentials {
    pub key_pair: UserKeyPair,
    pub certificate: UserCertificate,
    /// Issuer certificates, closest first; empty when self-signed
    pub issuer_chain: Vec<UserCertificate>,
}

impl GeneratedCredentials {
    /// Leaf followed by its issuers
    pub fn chain(&self) -> Vec<UserCertificate> {
        let mut chain = Vec::with_capacity(1 + self.issuer_chain.len());
        chain.push(self.certificate.clone());
        chain.extend(self.issuer_chain.iter().cloned());
        chain
    }
}

/// Produces a key pair and a signed certificate for a user
pub trait CertificateGenerator: Send + Sync {
    fn generate(&self, info: &UserInfo) -> Result<GeneratedCredentials>;
}

/// Fixed issuing authority used to sign user certificates
pub struct CertificateAuthority {
    signer: Certificate,
    key: KeyPair,
    chain: Vec<UserCertificate>,
}

impl CertificateAuthority {
    /// Load a CA from its PEM certificate (optionally followed by its own issuers) and PEM key
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let key = KeyPair::from_pem(key_pem)
            .map_err(|e| CertError::Config(format!("Invalid CA private key: {e}")))?;

        let mut chain = Vec::new();
        for pem in parse_certificate_chain(cert_pem).certificates() {
            chain.push(UserCertificate::from_der(pem.to_der()?)?);
        }
        let ca_cert = chain
            .first()
            .ok_or_else(|| CertError::Config("No CA certificate found in PEM".to_string()))?;
        if !ca_cert.matches_public_key(key.public_key_raw()) {
            return Err(CertError::Config(
                "CA private key does not match the CA certificate".to_string(),
            ));
        }

        // rcgen needs a Certificate value for the issuer; re-sign the parsed
        // parameters so the issuer DN and key identifier match the original
        let params = CertificateParams::from_ca_cert_pem(cert_pem)
            .map_err(|e| CertError::Config(format!("Invalid CA certificate: {e}")))?;
        let signer = params
            .self_signed(&key)
            .map_err(|e| CertError::Config(format!("Unusable CA certificate: {e}")))?;

        Ok(Self { signer, key, chain })
    }

    pub fn load<P: AsRef<Path>>(cert_path: P, key_path: P) -> Result<Self> {
        let cert_pem = std::fs::read_to_string(cert_path.as_ref())?;
        let key_pem = zeroize::Zeroizing::new(std::fs::read_to_string(key_path.as_ref())?);
        Self::from_pem(&cert_pem, &key_pem)
    }

    /// Issuer chain shipped alongside every issued certificate
    pub fn chain(&self) -> &[UserCertificate] {
        &self.chain
    }
}

/// rcgen-backed generator: ECDSA P-256, self-signed or CA-signed
pub struct RcgenGenerator {
    validity: Duration,
    authority: Option<CertificateAuthority>,
}

impl RcgenGenerator {
    pub fn new(validity_years: u32) -> Self {
        Self {
            validity: Duration::days(365 * i64::from(validity_years.max(1))),
            authority: None,
        }
    }

    pub fn with_authority(mut self, authority: CertificateAuthority) -> Self {
        self.authority = Some(authority);
        self
    }

    pub fn is_self_signing(&self) -> bool {
        self.authority.is_none()
    }

    fn build_params(&self, info: &UserInfo) -> Result<CertificateParams> {
        let mut params = CertificateParams::default();
        params.distinguished_name = subject_name(info)?;

        if let Some(email) = &info.email {
            let san: Ia5String = email
                .clone()
                .try_into()
                .map_err(|e| CertError::InvalidSubject(format!("invalid email {email}: {e}")))?;
            params.subject_alt_names.push(SanType::Rfc822Name(san));
        }

        let now = OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + self.validity;
        params.serial_number = Some(rcgen::SerialNumber::from_slice(
            &SerialNumber::random().to_bytes(),
        ));

        params.is_ca = IsCa::ExplicitNoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::ContentCommitment,
        ];
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::EmailProtection,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];
        params.use_authority_key_identifier_extension = self.authority.is_some();

        Ok(params)
    }
}

impl Default for RcgenGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_VALIDITY_YEARS)
    }
}

impl CertificateGenerator for RcgenGenerator {
    fn generate(&self, info: &UserInfo) -> Result<GeneratedCredentials> {
        let params = self.build_params(info)?;

        let key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)
            .map_err(|e| CertError::KeyGeneration(e.to_string()))?;

        let (cert, issuer_chain) = match &self.authority {
            Some(ca) => {
                let cert = params
                    .signed_by(&key, &ca.signer, &ca.key)
                    .map_err(|e| CertError::KeyGeneration(format!("signing failed: {e}")))?;
                (cert, ca.chain.clone())
            }
            None => {
                let cert = params
                    .self_signed(&key)
                    .map_err(|e| CertError::KeyGeneration(format!("signing failed: {e}")))?;
                (cert, Vec::new())
            }
        };

        let key_der = zeroize::Zeroizing::new(key.serialize_der());
        let key_pair = UserKeyPair::from_pkcs8(&key_der)
            .map_err(|e| CertError::KeyGeneration(e.to_string()))?;
        let certificate = UserCertificate::from_der(cert.der().to_vec())?;

        tracing::debug!(
            "Generated {} certificate for user {}",
            if issuer_chain.is_empty() {
                "self-signed"
            } else {
                "CA-signed"
            },
            info.user_id
        );

        Ok(GeneratedCredentials {
            key_pair,
            certificate,
            issuer_chain,
        })
    }
}

/// Deterministic subject: CN, O, OU, C, emailAddress, UID
fn subject_name(info: &UserInfo) -> Result<DistinguishedName> {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, info.common_name.as_str());
    if let Some(org) = &info.organization {
        dn.push(DnType::OrganizationName, org.as_str());
    }
    if let Some(unit) = &info.organizational_unit {
        dn.push(DnType::OrganizationalUnitName, unit.as_str());
    }
    if let Some(country) = info.country() {
        dn.push(DnType::CountryName, country);
    }
    if let Some(email) = &info.email {
        let value: Ia5String = email
            .clone()
            .try_into()
            .map_err(|e| CertError::InvalidSubject(format!("invalid email {email}: {e}")))?;
        dn.push(
            DnType::CustomDnType(OID_EMAIL_ADDRESS.to_vec()),
            DnValue::Ia5String(value),
        );
    }
    dn.push(
        DnType::CustomDnType(OID_USER_ID.to_vec()),
        info.user_id.as_str(),
    );
    Ok(dn)
}
