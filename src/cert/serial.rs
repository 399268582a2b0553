use rand::RngCore;
use std::fmt;

/// Length of freshly generated serial numbers, in bytes
pub const SERIAL_LENGTH: usize = 16;

/// Certificate serial number, kept as lowercase hex without separators
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerialNumber {
    hex: String,
}

impl SerialNumber {
    /// Create a new SerialNumber from a hex string (with or without colons)
    pub fn new(hex_string: &str) -> Self {
        let hex = hex_string.replace(':', "").to_lowercase();
        Self { hex }
    }

    /// Generate a random positive serial number
    pub fn random() -> Self {
        let mut bytes = [0u8; SERIAL_LENGTH];
        rand::rng().fill_bytes(&mut bytes);
        // DER INTEGER must stay positive and non-zero in its first octet
        bytes[0] &= 0x7f;
        bytes[0] |= 0x01;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            hex: hex::encode(bytes),
        }
    }

    /// Get the raw hex format (no colons)
    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    /// Big-endian bytes of the serial
    pub fn to_bytes(&self) -> Vec<u8> {
        hex::decode(&self.hex).unwrap_or_default()
    }

    /// Get the colon-separated hex format (e.g., "3b:fc:2e:b1...")
    pub fn as_colon_hex(&self) -> String {
        self.hex
            .as_bytes()
            .chunks(2)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex)
    }
}
