use serde::{Deserialize, Serialize};

/// Vault format variant. Closed set; every consumer matches exhaustively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatVersion {
    /// AES-SIV names, AES-GCM header and content
    #[default]
    SivGcm,
}

/// Text encoding applied to encrypted file names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameEncoding {
    /// RFC 4648 §5 URL-safe base64, padded
    #[default]
    Base64url,
    /// RFC 4648 §4 standard base64, padded
    Base64,
    /// RFC 4648 §6 base32, padded
    Base32,
}
