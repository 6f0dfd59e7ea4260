//! Directory ids, their storage paths, and per-directory name cryptors
//!
//! Directory metadata is stored as the raw directory id: the encrypt and
//! decrypt transforms below are identities in this format version. What
//! hides the directory structure is the hashed storage path, not the
//! metadata file.

use uuid::Uuid;

use cvault_core::{CryptoError, CryptoResult};

use crate::names::FileNameCryptor;

/// Root of the storage tree that holds every directory
pub const DATA_DIR: &str = "d";

const SHARD_LEN: usize = 2;

/// Metadata of one directory: its immutable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryMetadata {
    dir_id: Vec<u8>,
}

impl DirectoryMetadata {
    pub fn dir_id(&self) -> &[u8] {
        &self.dir_id
    }

    pub fn is_root(&self) -> bool {
        self.dir_id.is_empty()
    }
}

/// Manages directory-id lifecycle and name encryption within a directory.
#[derive(Clone)]
pub struct DirectoryContentCryptor {
    names: FileNameCryptor,
    suffix: String,
}

impl DirectoryContentCryptor {
    pub fn new(names: FileNameCryptor, suffix: impl Into<String>) -> Self {
        Self {
            names,
            suffix: suffix.into(),
        }
    }

    /// Suffix appended to every encrypted name
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn root_directory_metadata(&self) -> DirectoryMetadata {
        DirectoryMetadata { dir_id: Vec::new() }
    }

    /// Metadata with a fresh random printable id.
    pub fn new_directory_metadata(&self) -> DirectoryMetadata {
        let dir_id = Uuid::new_v4().to_string().into_bytes();
        tracing::debug!("created directory id");
        DirectoryMetadata { dir_id }
    }

    /// Identity: the directory id is stored in the clear.
    pub fn encrypt_directory_metadata(&self, metadata: &DirectoryMetadata) -> Vec<u8> {
        metadata.dir_id.clone()
    }

    /// Identity: the stored bytes are the directory id.
    pub fn decrypt_directory_metadata(&self, ciphertext: &[u8]) -> DirectoryMetadata {
        DirectoryMetadata {
            dir_id: ciphertext.to_vec(),
        }
    }

    /// Storage path of a directory: `d/<2 chars>/<30 chars>`.
    pub fn dir_path(&self, metadata: &DirectoryMetadata) -> CryptoResult<String> {
        let hashed = self.names.hash_directory_id(&metadata.dir_id)?;
        let (shard, rest) = hashed.split_at(SHARD_LEN);
        Ok(format!("{DATA_DIR}/{shard}/{rest}"))
    }

    /// Encrypts cleartext names for entries of the given directory.
    pub fn file_name_encryptor<'a>(
        &'a self,
        metadata: &'a DirectoryMetadata,
    ) -> impl Fn(&str) -> CryptoResult<String> + 'a {
        move |cleartext_name| {
            let encrypted = self
                .names
                .encrypt_filename(cleartext_name, &[metadata.dir_id()])?;
            Ok(format!("{encrypted}{}", self.suffix))
        }
    }

    /// Decrypts suffixed ciphertext names of entries of the given directory.
    pub fn file_name_decryptor<'a>(
        &'a self,
        metadata: &'a DirectoryMetadata,
    ) -> impl Fn(&str) -> CryptoResult<String> + 'a {
        move |ciphertext_name| {
            let encrypted = ciphertext_name.strip_suffix(self.suffix.as_str()).ok_or_else(|| {
                CryptoError::invalid(format!(
                    "encrypted name does not end with {}",
                    self.suffix
                ))
            })?;
            self.names
                .decrypt_filename(encrypted, &[metadata.dir_id()])
        }
    }
}
