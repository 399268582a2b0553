use crate::utils::errors::{CertError, Result};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, KeyPair, UnparsedPublicKey, ECDSA_P256_SHA256_ASN1,
    ECDSA_P256_SHA256_ASN1_SIGNING,
};
use std::fmt;
use zeroize::Zeroizing;

/// ECDSA P-256 key pair held as PKCS#8 DER.
///
/// The private key bytes are wiped when the value is dropped.
pub struct UserKeyPair {
    pkcs8_der: Zeroizing<Vec<u8>>,
    public_key: Vec<u8>,
}

impl UserKeyPair {
    /// Generate a fresh key pair from the OS CSPRNG
    pub fn generate() -> Result<Self> {
        let rng = SystemRandom::new();
        let document = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .map_err(|e| CertError::KeyGeneration(format!("key generation failed: {e}")))?;
        Self::from_pkcs8(document.as_ref())
    }

    /// Load a key pair from PKCS#8 DER
    pub fn from_pkcs8(der: &[u8]) -> Result<Self> {
        let rng = SystemRandom::new();
        let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, der, &rng)
            .map_err(|e| CertError::CorruptKeystore(format!("unusable private key: {e}")))?;

        Ok(Self {
            pkcs8_der: Zeroizing::new(der.to_vec()),
            public_key: key_pair.public_key().as_ref().to_vec(),
        })
    }

    pub fn pkcs8_der(&self) -> &[u8] {
        &self.pkcs8_der
    }

    /// Uncompressed SEC1 public key (65 bytes)
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Sign `message` (ECDSA P-256 + SHA-256, ASN.1 DER signature)
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, self.pkcs8_der(), &rng)
                .map_err(|e| CertError::Signing(format!("key load failed: {e}")))?;
        let signature = key_pair
            .sign(&rng, message)
            .map_err(|e| CertError::Signing(format!("signing failed: {e}")))?;
        Ok(signature.as_ref().to_vec())
    }
}

impl PartialEq for UserKeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.pkcs8_der() == other.pkcs8_der()
    }
}

impl fmt::Debug for UserKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserKeyPair")
            .field("public_key", &hex::encode(&self.public_key))
            .finish_non_exhaustive()
    }
}

/// Verify an ECDSA P-256 signature against a raw public key
pub fn verify_signature(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
    UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, public_key)
        .verify(message, signature)
        .map_err(|_| CertError::Signing("signature verification failed".to_string()))
}
