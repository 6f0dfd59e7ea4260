use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CvaultError, CvaultResult};
use crate::types::{FormatVersion, NameEncoding};

/// Top-level configuration (loaded from cvault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CvaultConfig {
    pub log: LogConfig,
    pub vault: VaultConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

/// Vault format parameters shared by every cryptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Format variant (default: siv-gcm)
    pub format: FormatVersion,
    /// Encoding of encrypted names (default: base64url)
    pub name_encoding: NameEncoding,
    /// Suffix appended to every encrypted name (default: .c9r)
    pub file_name_suffix: String,
    /// Value written into the reserved header field of new files (default: -1)
    pub reserved_sentinel: i64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            format: FormatVersion::SivGcm,
            name_encoding: NameEncoding::Base64url,
            file_name_suffix: ".c9r".into(),
            reserved_sentinel: -1,
        }
    }
}

impl CvaultConfig {
    /// Load from a TOML file, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> CvaultResult<Self> {
        if !path.exists() {
            tracing::debug!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| CvaultError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
