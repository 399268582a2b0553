use crate::cert::metadata::CertificateMetadata;
use crate::cert::parser::CertificateParser;
use crate::utils::errors::Result;
use crate::utils::pem::PemCertificate;
use std::fmt;

/// DER-encoded X.509 certificate, validated on construction
#[derive(Clone, PartialEq, Eq)]
pub struct UserCertificate {
    der: Vec<u8>,
}

impl UserCertificate {
    pub fn from_der(der: Vec<u8>) -> Result<Self> {
        CertificateParser::parse_der(&der)?;
        Ok(Self { der })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_der(PemCertificate::new(pem.to_string()).to_der()?)
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    pub fn to_pem(&self) -> PemCertificate {
        PemCertificate::from_der(&self.der)
    }

    pub fn metadata(&self) -> Result<CertificateMetadata> {
        CertificateParser::parse_der(&self.der)
    }

    /// Raw subject public key bits
    pub fn public_key(&self) -> Result<Vec<u8>> {
        CertificateParser::public_key(&self.der)
    }

    /// Whether this certificate certifies the given raw public key
    pub fn matches_public_key(&self, public_key: &[u8]) -> bool {
        self.public_key()
            .map(|pk| pk == public_key)
            .unwrap_or(false)
    }
}

impl fmt::Debug for UserCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCertificate")
            .field("fingerprint", &crate::cert::parser::fingerprint(&self.der))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::CertError;

    #[test]
    fn test_rejects_invalid_der() {
        assert!(matches!(
            UserCertificate::from_der(vec![0x30, 0x03, 0x02, 0x01, 0x01]),
            Err(CertError::CertParsing(_))
        ));
    }

    #[test]
    fn test_pem_round_trip() {
        let key = rcgen::KeyPair::generate().unwrap();
        let cert = rcgen::CertificateParams::new(vec!["pem.test".to_string()])
            .unwrap()
            .self_signed(&key)
            .unwrap();

        let from_rcgen = UserCertificate::from_pem(&cert.pem()).unwrap();
        assert_eq!(from_rcgen.der(), cert.der().as_ref());
        let again = UserCertificate::from_pem(from_rcgen.to_pem().pem_data()).unwrap();
        assert_eq!(again, from_rcgen);
        assert!(from_rcgen.matches_public_key(key.public_key_raw()));
    }
}
