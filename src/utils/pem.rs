use crate::utils::errors::{CertError, Result};
use base64::{engine::general_purpose, Engine as _};

const PEM_LINE_WIDTH: usize = 64;
const CERT_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const CERT_END: &str = "-----END CERTIFICATE-----";

/// Represents a PEM-encoded certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PemCertificate {
    pem_data: String,
}

/// Represents a chain of PEM certificates
#[derive(Debug, Clone, Default)]
pub struct PemCertificateChain {
    certificates: Vec<PemCertificate>,
}

impl PemCertificate {
    /// Create a new PEM certificate from PEM data
    pub fn new(pem_data: String) -> Self {
        Self {
            pem_data: normalize_pem(&pem_data),
        }
    }

    /// Wrap DER bytes in a PEM armor
    pub fn from_der(der: &[u8]) -> Self {
        let encoded = general_purpose::STANDARD.encode(der);
        let mut pem_data = String::with_capacity(encoded.len() + 64);
        pem_data.push_str(CERT_BEGIN);
        pem_data.push('\n');
        for chunk in encoded.as_bytes().chunks(PEM_LINE_WIDTH) {
            // base64 output is always ASCII
            pem_data.push_str(&String::from_utf8_lossy(chunk));
            pem_data.push('\n');
        }
        pem_data.push_str(CERT_END);
        pem_data.push('\n');
        Self { pem_data }
    }

    /// Get the raw PEM data
    pub fn pem_data(&self) -> &str {
        &self.pem_data
    }

    /// Decode the PEM body back to DER
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let body = extract_cert_body(&self.pem_data)?;
        general_purpose::STANDARD
            .decode(body)
            .map_err(|e| CertError::CertParsing(format!("Base64 decode error: {e}")))
    }
}

impl PemCertificateChain {
    pub fn new() -> Self {
        Self {
            certificates: Vec::new(),
        }
    }

    /// Add a certificate to the chain
    pub fn add_certificate(&mut self, cert: PemCertificate) {
        self.certificates.push(cert);
    }

    /// Get all certificates in the chain
    pub fn certificates(&self) -> &[PemCertificate] {
        &self.certificates
    }

    /// Get raw PEM data for all certificates concatenated
    pub fn pem_data(&self) -> String {
        self.certificates
            .iter()
            .map(|cert| cert.pem_data())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Normalize PEM data to end with exactly one newline
fn normalize_pem(pem_data: &str) -> String {
    let trimmed = pem_data.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{trimmed}\n")
}

/// Extract the base64 body of the first certificate block
fn extract_cert_body(pem_data: &str) -> Result<String> {
    let mut in_cert = false;
    let mut cert_lines = Vec::new();

    for line in pem_data.lines() {
        let line = line.trim();
        if line == CERT_BEGIN {
            in_cert = true;
            continue;
        } else if line == CERT_END {
            break;
        } else if in_cert {
            cert_lines.push(line);
        }
    }

    if cert_lines.is_empty() {
        return Err(CertError::CertParsing(
            "No certificate data found in PEM".to_string(),
        ));
    }

    Ok(cert_lines.join(""))
}

/// Parse multiple certificates from a PEM string
pub fn parse_certificate_chain(pem_data: &str) -> PemCertificateChain {
    let mut chain = PemCertificateChain::new();
    let mut current_cert = String::new();
    let mut in_cert = false;

    for line in pem_data.lines() {
        if line.starts_with(CERT_BEGIN) {
            in_cert = true;
            current_cert.clear();
            current_cert.push_str(line);
            current_cert.push('\n');
        } else if line.starts_with(CERT_END) {
            current_cert.push_str(line);
            current_cert.push('\n');
            chain.add_certificate(PemCertificate::new(current_cert.clone()));
            current_cert.clear();
            in_cert = false;
        } else if in_cert {
            current_cert.push_str(line);
            current_cert.push('\n');
        }
    }

    chain
}
