use crate::cert::certificate::UserCertificate;
use crate::cert::generate::GeneratedCredentials;
use crate::crypto::keys::UserKeyPair;
use crate::utils::errors::{CertError, Result};
use p12_keystore::{Certificate as P12Certificate, KeyStore, KeyStoreEntry, PrivateKeyChain};
use sha2::{Digest, Sha256};
use x509_parser::der_parser::parse_ber;

/// PFX version mandated by RFC 7292
const PFX_VERSION: u32 = 3;

/// A private key and its certificate chain under one alias
#[derive(Debug, PartialEq)]
pub struct UserKeystore {
    alias: String,
    key_pair: UserKeyPair,
    chain: Vec<UserCertificate>,
}

impl UserKeystore {
    /// Build a keystore; the first certificate of `chain` must certify `key_pair`
    pub fn new(
        alias: impl Into<String>,
        key_pair: UserKeyPair,
        chain: Vec<UserCertificate>,
    ) -> Result<Self> {
        let leaf = chain.first().ok_or_else(|| {
            CertError::InvalidInput("keystore requires at least one certificate".to_string())
        })?;
        if !leaf.matches_public_key(key_pair.public_key()) {
            return Err(CertError::InvalidInput(
                "leaf certificate does not match the private key".to_string(),
            ));
        }
        Ok(Self {
            alias: alias.into(),
            key_pair,
            chain,
        })
    }

    pub fn from_credentials(alias: impl Into<String>, credentials: GeneratedCredentials) -> Result<Self> {
        let chain = credentials.chain();
        Self::new(alias, credentials.key_pair, chain)
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn key_pair(&self) -> &UserKeyPair {
        &self.key_pair
    }

    /// The end-entity certificate
    pub fn certificate(&self) -> &UserCertificate {
        &self.chain[0]
    }

    /// Leaf first, then issuers
    pub fn chain(&self) -> &[UserCertificate] {
        &self.chain
    }

    /// Sign data with the stored private key
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.key_pair.sign(message)
    }
}

/// Encodes and decodes password-protected keystores
pub trait KeystoreCodec: Send + Sync {
    fn encode(&self, keystore: &UserKeystore, password: &str) -> Result<Vec<u8>>;

    /// Open `data`; `alias` names the entry the caller stored it under
    fn decode(&self, alias: &str, data: &[u8], password: &str) -> Result<UserKeystore>;
}

/// PKCS#12 keystore codec
#[derive(Debug, Default, Clone, Copy)]
pub struct Pkcs12Codec;

impl Pkcs12Codec {
    pub fn new() -> Self {
        Self
    }
}

impl KeystoreCodec for Pkcs12Codec {
    fn encode(&self, keystore: &UserKeystore, password: &str) -> Result<Vec<u8>> {
        require_password(password)?;

        let mut certs = Vec::with_capacity(keystore.chain.len());
        for cert in &keystore.chain {
            certs.push(
                P12Certificate::from_der(cert.der())
                    .map_err(|e| CertError::CertParsing(format!("PKCS#12 certificate: {e}")))?,
            );
        }

        let local_key_id = Sha256::digest(keystore.key_pair.public_key()).to_vec();
        let key_chain =
            PrivateKeyChain::new(keystore.key_pair.pkcs8_der().to_vec(), local_key_id, certs);

        let mut store = KeyStore::new();
        store.add_entry(&keystore.alias, KeyStoreEntry::PrivateKeyChain(key_chain));

        let encoded = store
            .writer(password)
            .write()
            .map_err(|e| CertError::KeystoreEncoding(e.to_string()))?;

        tracing::trace!(
            "Encoded PKCS#12 keystore for alias {} ({} bytes)",
            keystore.alias,
            encoded.len()
        );
        Ok(encoded)
    }

    fn decode(&self, alias: &str, data: &[u8], password: &str) -> Result<UserKeystore> {
        require_password(password)?;
        check_pfx_structure(data)?;

        // The MAC covers the whole content, so any failure past the
        // structural check means the password does not open this store
        let store = KeyStore::from_pkcs12(data, password).map_err(|e| {
            tracing::debug!("Failed to open keystore for alias {alias}: {e}");
            CertError::InvalidPassword
        })?;

        let (stored_alias, key_chain) = store.private_key_chain().ok_or_else(|| {
            CertError::CorruptKeystore("keystore holds no private key entry".to_string())
        })?;
        if stored_alias != alias {
            return Err(CertError::CorruptKeystore(format!(
                "keystore entry is {stored_alias}, expected {alias}"
            )));
        }

        let key_pair = UserKeyPair::from_pkcs8(key_chain.key())?;

        let mut chain = Vec::with_capacity(key_chain.chain().len());
        for cert in key_chain.chain() {
            let cert = UserCertificate::from_der(cert.as_der().to_vec())
                .map_err(|e| CertError::CorruptKeystore(e.to_string()))?;
            chain.push(cert);
        }

        // The reader puts the certificate sharing the key's local key id first
        let leaf_matches = chain
            .first()
            .is_some_and(|leaf| leaf.matches_public_key(key_pair.public_key()));
        if !leaf_matches {
            return Err(CertError::CorruptKeystore(
                "keystore certificate does not match the private key".to_string(),
            ));
        }

        Ok(UserKeystore {
            alias: stored_alias.to_string(),
            key_pair,
            chain,
        })
    }
}

fn require_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(CertError::InvalidInput(
            "keystore password must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Password-free sanity check of the outer PFX structure
fn check_pfx_structure(data: &[u8]) -> Result<()> {
    let (rem, pfx) = parse_ber(data)
        .map_err(|e| CertError::CorruptKeystore(format!("not an ASN.1 structure: {e}")))?;
    if !rem.is_empty() {
        return Err(CertError::CorruptKeystore(format!(
            "{} trailing bytes after PFX",
            rem.len()
        )));
    }

    let items = pfx
        .as_sequence()
        .map_err(|_| CertError::CorruptKeystore("PFX is not a SEQUENCE".to_string()))?;
    let version = items
        .first()
        .and_then(|v| v.as_u32().ok())
        .ok_or_else(|| CertError::CorruptKeystore("missing PFX version".to_string()))?;
    if version != PFX_VERSION {
        return Err(CertError::CorruptKeystore(format!(
            "unsupported PFX version {version}"
        )));
    }
    if items.len() < 2 {
        return Err(CertError::CorruptKeystore(
            "missing authenticated safe".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::generate::{CertificateAuthority, CertificateGenerator, RcgenGenerator};
    use crate::crypto::keys::verify_signature;
    use crate::user::{UserInfo, UserProfile};
    use rcgen::{BasicConstraints, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose};

    fn keystore(user: &str) -> UserKeystore {
        let profile = UserProfile::new(user, user).with_email(format!("{user}@example.com"));
        let info = UserInfo::from_profile(&profile, None).unwrap();
        let credentials = RcgenGenerator::default().generate(&info).unwrap();
        UserKeystore::from_credentials(user, credentials).unwrap()
    }

    #[test]
    fn test_encode_decode_preserves_key_and_chain() {
        let codec = Pkcs12Codec::new();
        let original = keystore("alice");

        let encoded = codec.encode(&original, "pw1").unwrap();
        let decoded = codec.decode("alice", &encoded, "pw1").unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.alias(), "alice");
        assert_eq!(decoded.certificate().metadata().unwrap().cn, "alice");
    }

    #[test]
    fn test_decoded_key_signs_for_certificate() {
        let codec = Pkcs12Codec::new();
        let original = keystore("carol");
        let encoded = codec.encode(&original, "s3cret").unwrap();
        let decoded = codec.decode("carol", &encoded, "s3cret").unwrap();

        let message = b"signed by the stored key";
        let signature = decoded.sign(message).unwrap();
        let public_key = original.certificate().public_key().unwrap();
        verify_signature(&public_key, message, &signature).unwrap();
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let codec = Pkcs12Codec::new();
        let encoded = codec.encode(&keystore("alice"), "pw1").unwrap();

        for wrong in ["wrongpw", "pw2", "PW1", "pw1 "] {
            assert!(matches!(
                codec.decode("alice", &encoded, wrong),
                Err(CertError::InvalidPassword)
            ));
        }
    }

    #[test]
    fn test_malformed_bytes_are_corrupt() {
        let codec = Pkcs12Codec::new();
        assert!(matches!(
            codec.decode("alice", b"definitely not pkcs12", "pw"),
            Err(CertError::CorruptKeystore(_))
        ));
        assert!(matches!(
            codec.decode("alice", &[], "pw"),
            Err(CertError::CorruptKeystore(_))
        ));

        let encoded = codec.encode(&keystore("alice"), "pw").unwrap();
        let truncated = &encoded[..encoded.len() / 2];
        assert!(matches!(
            codec.decode("alice", truncated, "pw"),
            Err(CertError::CorruptKeystore(_))
        ));
    }

    #[test]
    fn test_empty_password_refused() {
        let codec = Pkcs12Codec::new();
        let ks = keystore("dave");
        assert!(matches!(
            codec.encode(&ks, ""),
            Err(CertError::InvalidInput(_))
        ));

        let encoded = codec.encode(&ks, "pw").unwrap();
        assert!(matches!(
            codec.decode("dave", &encoded, ""),
            Err(CertError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ca_signed_chain_round_trips_leaf_first() {
        let ca_key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params
            .distinguished_name
            .push(DnType::CommonName, "Keystore Test CA");
        params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
        params.key_usages = vec![KeyUsagePurpose::KeyCertSign];
        let ca_pem = params.self_signed(&ca_key).unwrap().pem();

        let authority = CertificateAuthority::from_pem(&ca_pem, &ca_key.serialize_pem()).unwrap();
        let profile = UserProfile::new("erin", "Erin").with_email("erin@example.com");
        let info = UserInfo::from_profile(&profile, None).unwrap();
        let credentials = RcgenGenerator::default()
            .with_authority(authority)
            .generate(&info)
            .unwrap();
        let original = UserKeystore::from_credentials("erin", credentials).unwrap();
        assert_eq!(original.chain().len(), 2);

        let codec = Pkcs12Codec::new();
        let encoded = codec.encode(&original, "pw").unwrap();
        let decoded = codec.decode("erin", &encoded, "pw").unwrap();

        assert_eq!(decoded, original);
        assert_eq!(decoded.chain()[0].metadata().unwrap().cn, "Erin");
        assert_eq!(decoded.chain()[1], UserCertificate::from_pem(&ca_pem).unwrap());
    }

    #[test]
    fn test_key_id_on_wrong_certificate_is_corrupt() {
        let alice = keystore("alice");
        let bob = keystore("bob");

        // alice's key stored against bob's certificate
        let cert = P12Certificate::from_der(bob.certificate().der()).unwrap();
        let local_key_id = Sha256::digest(alice.key_pair().public_key()).to_vec();
        let chain = PrivateKeyChain::new(alice.key_pair().pkcs8_der().to_vec(), local_key_id, [cert]);
        let mut store = KeyStore::new();
        store.add_entry("alice", KeyStoreEntry::PrivateKeyChain(chain));
        let encoded = store.writer("pw").write().unwrap();

        assert!(matches!(
            Pkcs12Codec::new().decode("alice", &encoded, "pw"),
            Err(CertError::CorruptKeystore(_))
        ));
    }

    #[test]
    fn test_alias_mismatch_is_corrupt() {
        let codec = Pkcs12Codec::new();
        let encoded = codec.encode(&keystore("bob"), "pw").unwrap();

        assert!(matches!(
            codec.decode("alice", &encoded, "pw"),
            Err(CertError::CorruptKeystore(_))
        ));
        assert_eq!(codec.decode("bob", &encoded, "pw").unwrap().alias(), "bob");
    }

    #[test]
    fn test_keystore_rejects_mismatched_leaf() {
        let a = keystore("a");
        let b = keystore("b");
        let other_key = UserKeyPair::from_pkcs8(b.key_pair().pkcs8_der()).unwrap();
        assert!(matches!(
            UserKeystore::new("a", other_key, a.chain().to_vec()),
            Err(CertError::InvalidInput(_))
        ));
    }
}
