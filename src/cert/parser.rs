use crate::cert::metadata::CertificateMetadata;
use crate::cert::SerialNumber;
use crate::utils::errors::{CertError, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use x509_parser::prelude::*;

pub struct CertificateParser;

impl CertificateParser {
    /// Parse DER certificate bytes into metadata
    pub fn parse_der(der: &[u8]) -> Result<CertificateMetadata> {
        let cert = Self::from_der(der)?;
        Ok(Self::extract_metadata(&cert, der))
    }

    /// Raw subject public key bits of a DER certificate
    pub fn public_key(der: &[u8]) -> Result<Vec<u8>> {
        let cert = Self::from_der(der)?;
        Ok(cert.public_key().subject_public_key.data.to_vec())
    }

    fn from_der(der: &[u8]) -> Result<X509Certificate<'_>> {
        let (rem, cert) = X509Certificate::from_der(der)
            .map_err(|e| CertError::CertParsing(format!("DER parsing error: {e}")))?;
        if !rem.is_empty() {
            return Err(CertError::CertParsing(format!(
                "{} trailing bytes after certificate",
                rem.len()
            )));
        }
        Ok(cert)
    }

    fn extract_metadata(cert: &X509Certificate, der: &[u8]) -> CertificateMetadata {
        let serial = SerialNumber::from_bytes(&cert.serial.to_bytes_be());

        let cn = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or("Unknown")
            .to_string();

        let not_before = DateTime::from_timestamp(cert.validity().not_before.timestamp(), 0)
            .unwrap_or_else(Utc::now);
        let not_after = DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0)
            .unwrap_or_else(Utc::now);

        let mut emails: Vec<String> = cert
            .subject()
            .iter_email()
            .filter_map(|attr| attr.as_str().ok())
            .map(|s| s.to_string())
            .collect();
        let mut key_usage = Vec::new();
        let mut extended_key_usage = Vec::new();
        let mut is_ca = false;

        for ext in cert.extensions() {
            match ext.parsed_extension() {
                ParsedExtension::SubjectAlternativeName(san) => {
                    for name in &san.general_names {
                        if let GeneralName::RFC822Name(email) = name {
                            if !emails.iter().any(|e| e.as_str() == *email) {
                                emails.push(email.to_string());
                            }
                        }
                    }
                }
                ParsedExtension::KeyUsage(ku) => {
                    let flags = [
                        (ku.digital_signature(), "DigitalSignature"),
                        (ku.non_repudiation(), "NonRepudiation"),
                        (ku.key_encipherment(), "KeyEncipherment"),
                        (ku.data_encipherment(), "DataEncipherment"),
                        (ku.key_agreement(), "KeyAgreement"),
                        (ku.key_cert_sign(), "KeyCertSign"),
                        (ku.crl_sign(), "CRLSign"),
                    ];
                    key_usage.extend(
                        flags
                            .iter()
                            .filter(|(set, _)| *set)
                            .map(|(_, name)| name.to_string()),
                    );
                }
                ParsedExtension::ExtendedKeyUsage(eku) => {
                    let flags = [
                        (eku.server_auth, "ServerAuth"),
                        (eku.client_auth, "ClientAuth"),
                        (eku.code_signing, "CodeSigning"),
                        (eku.email_protection, "EmailProtection"),
                        (eku.time_stamping, "TimeStamping"),
                        (eku.ocsp_signing, "OCSPSigning"),
                    ];
                    extended_key_usage.extend(
                        flags
                            .iter()
                            .filter(|(set, _)| *set)
                            .map(|(_, name)| name.to_string()),
                    );
                    extended_key_usage.extend(eku.other.iter().map(|oid| oid.to_id_string()));
                }
                ParsedExtension::BasicConstraints(bc) => {
                    is_ca = bc.ca;
                }
                _ => {}
            }
        }

        CertificateMetadata {
            serial,
            subject: cert.subject().to_string(),
            cn,
            issuer: cert.issuer().to_string(),
            not_before,
            not_after,
            emails,
            key_usage,
            extended_key_usage,
            is_ca,
            fingerprint: fingerprint(der),
        }
    }
}

/// SHA-256 fingerprint as colon-separated uppercase hex
pub fn fingerprint(der: &[u8]) -> String {
    let digest = Sha256::digest(der);
    digest
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcgen::{CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose};

    fn self_signed(cn: &str) -> Vec<u8> {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params.distinguished_name.push(DnType::CommonName, cn);
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        // rcgen emits no extensions at all for a bare NoCa leaf
        params.is_ca = IsCa::ExplicitNoCa;
        params.self_signed(&key).unwrap().der().to_vec()
    }

    #[test]
    fn test_parse_der_extracts_subject() {
        let der = self_signed("parser-test");
        let meta = CertificateParser::parse_der(&der).unwrap();

        assert_eq!(meta.cn, "parser-test");
        assert!(meta.subject.contains("parser-test"));
        assert!(meta.is_self_signed());
        assert_eq!(meta.key_usage, vec!["DigitalSignature".to_string()]);
        assert!(!meta.is_ca);
        assert_eq!(meta.fingerprint, fingerprint(&der));
    }

    #[test]
    fn test_public_key_is_uncompressed_point() {
        let der = self_signed("pk");
        let pk = CertificateParser::public_key(&der).unwrap();
        assert_eq!(pk.len(), 65);
        assert_eq!(pk[0], 0x04);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            CertificateParser::parse_der(b"not a certificate"),
            Err(CertError::CertParsing(_))
        ));
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = fingerprint(b"abc");
        assert_eq!(fp.split(':').count(), 32);
        assert!(fp.starts_with("BA:78:16:BF"));
    }
}
