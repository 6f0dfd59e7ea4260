//! Per-chunk AES-256-GCM encryption/decryption
//!
//! Encrypted chunk format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! AAD = chunk_number (8 bytes, big-endian) || header_nonce (12 bytes)
//! ```
//!
//! The AAD binds each chunk to its position and to one header instance,
//! preventing reordering, truncation, and cross-file splicing even between
//! files that happen to share a content key.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use cvault_core::{CryptoError, CryptoResult};

use crate::header::FileHeader;
use crate::{GCM_NONCE_SIZE, TAG_SIZE};

/// Maximum cleartext payload of one chunk
pub const CLEARTEXT_CHUNK_SIZE: usize = 32 * 1024;

/// Bytes added to every chunk: nonce + tag
pub const CHUNK_OVERHEAD: usize = GCM_NONCE_SIZE + TAG_SIZE;

/// Maximum encrypted chunk size
pub const CIPHERTEXT_CHUNK_SIZE: usize = CLEARTEXT_CHUNK_SIZE + CHUNK_OVERHEAD;

const AAD_SIZE: usize = 8 + GCM_NONCE_SIZE;

/// Encrypts and decrypts file content chunks with a header's content key.
///
/// Stateless: chunks of one file may be processed concurrently as long as
/// every chunk number is used once.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileContentCryptor;

impl FileContentCryptor {
    pub fn new() -> Self {
        Self
    }

    /// This format always authenticates; `decrypt_chunk(.., false)` is refused.
    pub fn can_skip_authentication(&self) -> bool {
        false
    }

    pub fn cleartext_chunk_size(&self) -> usize {
        CLEARTEXT_CHUNK_SIZE
    }

    pub fn ciphertext_chunk_size(&self) -> usize {
        CIPHERTEXT_CHUNK_SIZE
    }

    /// Encrypt one chunk.
    ///
    /// Returns: `[12-byte nonce][ciphertext][16-byte tag]`
    pub fn encrypt_chunk(
        &self,
        cleartext: &[u8],
        chunk_number: u64,
        header: &FileHeader,
    ) -> CryptoResult<Vec<u8>> {
        let mut ciphertext = vec![0u8; cleartext.len() + CHUNK_OVERHEAD];
        let written = self.encrypt_chunk_into(cleartext, &mut ciphertext, chunk_number, header)?;
        ciphertext.truncate(written);
        Ok(ciphertext)
    }

    /// Encrypt one chunk into a caller-supplied buffer, returning bytes written.
    pub fn encrypt_chunk_into(
        &self,
        cleartext: &[u8],
        ciphertext: &mut [u8],
        chunk_number: u64,
        header: &FileHeader,
    ) -> CryptoResult<usize> {
        if cleartext.is_empty() || cleartext.len() > CLEARTEXT_CHUNK_SIZE {
            return Err(CryptoError::invalid(format!(
                "invalid cleartext chunk size: {} bytes, expected range [1, {CLEARTEXT_CHUNK_SIZE}]",
                cleartext.len()
            )));
        }
        let required = cleartext.len() + CHUNK_OVERHEAD;
        if ciphertext.len() < required {
            return Err(CryptoError::invalid(format!(
                "ciphertext buffer too small: {} bytes, need {required}",
                ciphertext.len()
            )));
        }

        let mut nonce = [0u8; GCM_NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        seal(cleartext, &mut ciphertext[..required], chunk_number, header, &nonce)?;
        tracing::trace!(chunk_number, len = cleartext.len(), "encrypted chunk");
        Ok(required)
    }

    /// Decrypt one chunk. `authenticate` must be `true` for this format.
    pub fn decrypt_chunk(
        &self,
        ciphertext: &[u8],
        chunk_number: u64,
        header: &FileHeader,
        authenticate: bool,
    ) -> CryptoResult<Vec<u8>> {
        // sized before validation, so never larger than one chunk
        let capacity = ciphertext
            .len()
            .saturating_sub(CHUNK_OVERHEAD)
            .min(CLEARTEXT_CHUNK_SIZE);
        let mut cleartext = vec![0u8; capacity];
        let written =
            self.decrypt_chunk_into(ciphertext, &mut cleartext, chunk_number, header, authenticate)?;
        cleartext.truncate(written);
        Ok(cleartext)
    }

    /// Decrypt one chunk into a caller-supplied buffer, returning bytes written.
    ///
    /// On authentication failure the written region of `cleartext` is zeroed.
    pub fn decrypt_chunk_into(
        &self,
        ciphertext: &[u8],
        cleartext: &mut [u8],
        chunk_number: u64,
        header: &FileHeader,
        authenticate: bool,
    ) -> CryptoResult<usize> {
        if !authenticate {
            return Err(CryptoError::invalid(
                "this format does not support skipping authentication",
            ));
        }
        if ciphertext.len() < CHUNK_OVERHEAD || ciphertext.len() > CIPHERTEXT_CHUNK_SIZE {
            return Err(CryptoError::invalid(format!(
                "invalid ciphertext chunk size: {} bytes, expected range [{CHUNK_OVERHEAD}, {CIPHERTEXT_CHUNK_SIZE}]",
                ciphertext.len()
            )));
        }
        let payload_len = ciphertext.len() - CHUNK_OVERHEAD;
        if cleartext.len() < payload_len {
            return Err(CryptoError::invalid(format!(
                "cleartext buffer too small: {} bytes, need {payload_len}",
                cleartext.len()
            )));
        }

        let (nonce, rest) = ciphertext.split_at(GCM_NONCE_SIZE);
        let (payload, tag) = rest.split_at(payload_len);
        let out = &mut cleartext[..payload_len];
        out.copy_from_slice(payload);

        let cipher = Aes256Gcm::new(header.content_key().as_bytes().into());
        let aad = chunk_aad(chunk_number, header.nonce());
        if cipher
            .decrypt_in_place_detached(Nonce::from_slice(nonce), &aad, out, Tag::from_slice(tag))
            .is_err()
        {
            out.zeroize();
            tracing::warn!(chunk_number, "chunk failed authentication");
            return Err(CryptoError::auth(format!(
                "chunk {chunk_number}: tag mismatch (wrong key, corrupted data, or wrong position/header)"
            )));
        }
        tracing::trace!(chunk_number, len = payload_len, "decrypted chunk");
        Ok(payload_len)
    }

    /// Total ciphertext size of `cleartext_size` bytes of content (header excluded).
    pub fn ciphertext_size(&self, cleartext_size: u64) -> u64 {
        let full = cleartext_size / CLEARTEXT_CHUNK_SIZE as u64;
        let rest = cleartext_size % CLEARTEXT_CHUNK_SIZE as u64;
        let tail = if rest > 0 { rest + CHUNK_OVERHEAD as u64 } else { 0 };
        full * CIPHERTEXT_CHUNK_SIZE as u64 + tail
    }

    /// Cleartext size of `ciphertext_size` bytes of content (header excluded).
    pub fn cleartext_size(&self, ciphertext_size: u64) -> CryptoResult<u64> {
        let full = ciphertext_size / CIPHERTEXT_CHUNK_SIZE as u64;
        let rest = ciphertext_size % CIPHERTEXT_CHUNK_SIZE as u64;
        if rest > 0 && rest < CHUNK_OVERHEAD as u64 {
            return Err(CryptoError::invalid(format!(
                "ciphertext size {ciphertext_size} ends in a {rest}-byte fragment"
            )));
        }
        let tail = if rest > 0 { rest - CHUNK_OVERHEAD as u64 } else { 0 };
        Ok(full * CLEARTEXT_CHUNK_SIZE as u64 + tail)
    }
}

/// `out` must be exactly `cleartext.len() + CHUNK_OVERHEAD` bytes.
fn seal(
    cleartext: &[u8],
    out: &mut [u8],
    chunk_number: u64,
    header: &FileHeader,
    nonce: &[u8; GCM_NONCE_SIZE],
) -> CryptoResult<()> {
    let (nonce_out, rest) = out.split_at_mut(GCM_NONCE_SIZE);
    let (payload, tag_out) = rest.split_at_mut(cleartext.len());
    nonce_out.copy_from_slice(nonce);
    payload.copy_from_slice(cleartext);

    let cipher = Aes256Gcm::new(header.content_key().as_bytes().into());
    let aad = chunk_aad(chunk_number, header.nonce());
    match cipher.encrypt_in_place_detached(Nonce::from_slice(nonce), &aad, payload) {
        Ok(tag) => {
            tag_out.copy_from_slice(&tag);
            Ok(())
        }
        Err(_) => {
            payload.zeroize();
            Err(CryptoError::internal("chunk encryption failed"))
        }
    }
}

/// Build AAD: chunk_number (8 bytes BE) || header_nonce (12 bytes)
fn chunk_aad(chunk_number: u64, header_nonce: &[u8; GCM_NONCE_SIZE]) -> [u8; AAD_SIZE] {
    let mut aad = [0u8; AAD_SIZE];
    aad[..8].copy_from_slice(&chunk_number.to_be_bytes());
    aad[8..].copy_from_slice(header_nonce);
    aad
}
