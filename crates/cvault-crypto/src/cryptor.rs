//! Entry point that wires the per-purpose cryptors for one vault

use std::sync::Arc;

use cvault_core::config::VaultConfig;
use cvault_core::FormatVersion;

use crate::chunk::FileContentCryptor;
use crate::dirs::DirectoryContentCryptor;
use crate::header::FileHeaderCryptor;
use crate::masterkey::MasterkeyProvider;
use crate::names::FileNameCryptor;

/// All cryptors of one vault, sharing a masterkey provider.
#[derive(Clone)]
pub struct Cryptor {
    format: FormatVersion,
    header: FileHeaderCryptor,
    content: FileContentCryptor,
    names: FileNameCryptor,
    dirs: DirectoryContentCryptor,
}

impl std::fmt::Debug for Cryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cryptor")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl Cryptor {
    pub fn new(masterkey: Arc<dyn MasterkeyProvider>, config: &VaultConfig) -> Self {
        match config.format {
            FormatVersion::SivGcm => {
                let names = FileNameCryptor::new(Arc::clone(&masterkey), config.name_encoding);
                Self {
                    format: config.format,
                    header: FileHeaderCryptor::new(masterkey, config.reserved_sentinel),
                    content: FileContentCryptor::new(),
                    dirs: DirectoryContentCryptor::new(names.clone(), &config.file_name_suffix),
                    names,
                }
            }
        }
    }

    pub fn format(&self) -> FormatVersion {
        self.format
    }

    pub fn file_header_cryptor(&self) -> &FileHeaderCryptor {
        &self.header
    }

    pub fn file_content_cryptor(&self) -> &FileContentCryptor {
        &self.content
    }

    pub fn file_name_cryptor(&self) -> &FileNameCryptor {
        &self.names
    }

    pub fn directory_content_cryptor(&self) -> &DirectoryContentCryptor {
        &self.dirs
    }
}
