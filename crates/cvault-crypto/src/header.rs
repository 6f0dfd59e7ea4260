//! Per-file header carrying the random content key
//!
//! Encrypted header format (68 bytes):
//! ```text
//! [12 bytes: nonce][40 bytes: AES-GCM(reserved BE64 || content key)][16 bytes: tag]
//! key = vault encryption key, nonce = header nonce, no AAD
//! ```

use std::sync::Arc;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use cvault_core::{CryptoError, CryptoResult};

use crate::keys::SymmetricKey;
use crate::masterkey::MasterkeyProvider;
use crate::{GCM_NONCE_SIZE, KEY_SIZE, TAG_SIZE};

const RESERVED_SIZE: usize = 8;
const PAYLOAD_SIZE: usize = RESERVED_SIZE + KEY_SIZE;

/// Size of an encrypted file header in bytes.
pub const HEADER_SIZE: usize = GCM_NONCE_SIZE + PAYLOAD_SIZE + TAG_SIZE;

/// Cleartext file header. The content key is zeroized on drop.
#[derive(Debug, Clone)]
pub struct FileHeader {
    nonce: [u8; GCM_NONCE_SIZE],
    reserved: i64,
    content_key: SymmetricKey,
}

impl FileHeader {
    pub fn new(nonce: [u8; GCM_NONCE_SIZE], reserved: i64, content_key: SymmetricKey) -> Self {
        Self {
            nonce,
            reserved,
            content_key,
        }
    }

    pub fn nonce(&self) -> &[u8; GCM_NONCE_SIZE] {
        &self.nonce
    }

    /// Caller-defined 64-bit field, e.g. a size marker.
    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    pub fn set_reserved(&mut self, reserved: i64) {
        self.reserved = reserved;
    }

    pub fn content_key(&self) -> &SymmetricKey {
        &self.content_key
    }
}

/// Creates, encrypts, and decrypts [`FileHeader`]s under the vault encryption key.
#[derive(Clone)]
pub struct FileHeaderCryptor {
    masterkey: Arc<dyn MasterkeyProvider>,
    reserved_sentinel: i64,
}

impl FileHeaderCryptor {
    pub fn new(masterkey: Arc<dyn MasterkeyProvider>, reserved_sentinel: i64) -> Self {
        Self {
            masterkey,
            reserved_sentinel,
        }
    }

    pub fn header_size(&self) -> usize {
        HEADER_SIZE
    }

    /// A fresh header with random nonce and content key.
    pub fn create(&self) -> FileHeader {
        let mut nonce = [0u8; GCM_NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        tracing::debug!("created file header");
        FileHeader::new(nonce, self.reserved_sentinel, SymmetricKey::generate())
    }

    pub fn encrypt_header(&self, header: &FileHeader) -> CryptoResult<Vec<u8>> {
        let mut payload = Zeroizing::new([0u8; PAYLOAD_SIZE]);
        payload[..RESERVED_SIZE].copy_from_slice(&header.reserved.to_be_bytes());
        payload[RESERVED_SIZE..].copy_from_slice(header.content_key.as_bytes());

        let cipher = self.cipher()?;
        let sealed = cipher
            .encrypt(Nonce::from_slice(&header.nonce), payload.as_slice())
            .map_err(|_| CryptoError::internal("header encryption failed"))?;

        let mut result = Vec::with_capacity(HEADER_SIZE);
        result.extend_from_slice(&header.nonce);
        result.extend_from_slice(&sealed);
        Ok(result)
    }

    /// Decrypt the first [`HEADER_SIZE`] bytes of `ciphertext`.
    pub fn decrypt_header(&self, ciphertext: &[u8]) -> CryptoResult<FileHeader> {
        if ciphertext.len() < HEADER_SIZE {
            return Err(CryptoError::invalid(format!(
                "malformed ciphertext header: {} bytes (minimum {HEADER_SIZE})",
                ciphertext.len()
            )));
        }

        let (nonce_bytes, sealed) = ciphertext[..HEADER_SIZE].split_at(GCM_NONCE_SIZE);
        let mut nonce = [0u8; GCM_NONCE_SIZE];
        nonce.copy_from_slice(nonce_bytes);

        let cipher = self.cipher()?;
        let payload = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(&nonce), sealed)
                .map_err(|_| {
                    tracing::warn!("file header failed authentication");
                    CryptoError::auth("header tag mismatch")
                })?,
        );
        if payload.len() != PAYLOAD_SIZE {
            return Err(CryptoError::internal(format!(
                "header payload has {} bytes",
                payload.len()
            )));
        }

        let mut reserved = [0u8; RESERVED_SIZE];
        reserved.copy_from_slice(&payload[..RESERVED_SIZE]);
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&payload[RESERVED_SIZE..]);
        let content_key = SymmetricKey::from_bytes(key);
        key.zeroize();

        Ok(FileHeader::new(nonce, i64::from_be_bytes(reserved), content_key))
    }

    fn cipher(&self) -> CryptoResult<Aes256Gcm> {
        let enc_key = self.masterkey.encryption_key()?;
        Ok(Aes256Gcm::new(enc_key.as_bytes().into()))
    }
}
