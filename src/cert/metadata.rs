use crate::cert::SerialNumber;
use chrono::{DateTime, Utc};
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Parsed, human-oriented view of a user certificate
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateMetadata {
    pub serial: SerialNumber,
    pub subject: String,
    pub cn: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub emails: Vec<String>,
    pub key_usage: Vec<String>,
    pub extended_key_usage: Vec<String>,
    pub is_ca: bool,
    pub fingerprint: String,
}

impl CertificateMetadata {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.not_after
    }

    pub fn expires_soon(&self, days: u32) -> bool {
        let threshold = Utc::now() + chrono::Duration::days(days as i64);
        self.not_after <= threshold
    }

    pub fn is_self_signed(&self) -> bool {
        self.subject == self.issuer
    }

    /// Summary rows in display order
    pub fn summary_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("Subject".to_string(), self.subject.clone()),
            ("Issuer".to_string(), self.issuer.clone()),
            ("Serial".to_string(), self.serial.as_colon_hex()),
            (
                "Not Before".to_string(),
                self.not_before.format(DATE_FORMAT).to_string(),
            ),
            (
                "Not After".to_string(),
                self.not_after.format(DATE_FORMAT).to_string(),
            ),
        ];
        if !self.emails.is_empty() {
            pairs.push(("Email".to_string(), self.emails.join(",")));
        }
        if !self.key_usage.is_empty() {
            pairs.push(("Key Usage".to_string(), self.key_usage.join(",")));
        }
        if !self.extended_key_usage.is_empty() {
            pairs.push((
                "Ext Key Usage".to_string(),
                self.extended_key_usage.join(","),
            ));
        }
        pairs.push(("SHA-256".to_string(), self.fingerprint.clone()));
        pairs
    }
}

impl fmt::Display for CertificateMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = self.summary_pairs();
        let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 1;
        for (key, value) in pairs {
            writeln!(f, "{:<width$} {value}", format!("{key}:"), width = width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CertificateMetadata {
        let not_before = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        CertificateMetadata {
            serial: SerialNumber::new("0a1b2c"),
            subject: "CN=alice, O=Example".to_string(),
            cn: "alice".to_string(),
            issuer: "CN=alice, O=Example".to_string(),
            not_before,
            not_after: not_before + chrono::Duration::days(730),
            emails: vec!["alice@example.com".to_string()],
            key_usage: vec!["DigitalSignature".to_string()],
            extended_key_usage: Vec::new(),
            is_ca: false,
            fingerprint: "AA:BB".to_string(),
        }
    }

    #[test]
    fn test_summary_lists_core_fields() {
        let text = sample().to_string();
        assert!(text.contains("Subject:"));
        assert!(text.contains("CN=alice, O=Example"));
        assert!(text.contains("0a:1b:2c"));
        assert!(text.contains("2023-11-14 22:13:20 UTC"));
        assert!(text.contains("alice@example.com"));
        assert!(!text.contains("Ext Key Usage"));
    }

    #[test]
    fn test_expiry_checks() {
        let meta = sample();
        assert!(meta.is_expired());
        assert!(meta.expires_soon(1));
        assert!(meta.is_self_signed());
    }
}
