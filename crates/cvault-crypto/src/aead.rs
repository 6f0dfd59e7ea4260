//! AEAD whose key and nonce are both sliced from one derived secret
//!
//! Only safe when every secret is used exactly once, which holds for ECIES
//! because each message derives its secret from a fresh ephemeral key pair.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use zeroize::Zeroizing;

use cvault_core::{CryptoError, CryptoResult};

use crate::keys::SecretBytes;
use crate::{GCM_NONCE_SIZE, KEY_SIZE, TAG_SIZE};

/// Symmetric AEAD keyed by a single-use secret.
pub trait SecretNonceAead: Send + Sync {
    /// Number of secret bytes consumed per operation (key plus nonce).
    fn required_secret_bytes(&self) -> usize;

    /// Returns `ciphertext || tag`, without any nonce framing.
    fn encrypt(&self, secret: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>>;

    fn decrypt(&self, secret: &[u8], ciphertext: &[u8]) -> CryptoResult<SecretBytes>;
}

/// AES-256-GCM with `secret = key(32) || nonce(12)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmSecretNonce;

impl AesGcmSecretNonce {
    fn split<'a>(&self, secret: &'a [u8]) -> CryptoResult<(Aes256Gcm, &'a [u8])> {
        if secret.len() != self.required_secret_bytes() {
            return Err(CryptoError::invalid(format!(
                "AES-GCM secret must be {} bytes, got {}",
                self.required_secret_bytes(),
                secret.len()
            )));
        }
        let (key, nonce) = secret.split_at(KEY_SIZE);
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| CryptoError::internal("AES-GCM rejected a 32-byte key"))?;
        Ok((cipher, nonce))
    }
}

impl SecretNonceAead for AesGcmSecretNonce {
    fn required_secret_bytes(&self) -> usize {
        KEY_SIZE + GCM_NONCE_SIZE
    }

    fn encrypt(&self, secret: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let (cipher, nonce) = self.split(secret)?;
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| CryptoError::internal("AES-GCM encryption failed"))
    }

    fn decrypt(&self, secret: &[u8], ciphertext: &[u8]) -> CryptoResult<SecretBytes> {
        if ciphertext.len() < TAG_SIZE {
            return Err(CryptoError::invalid(format!(
                "ciphertext too short: {} bytes (minimum {TAG_SIZE})",
                ciphertext.len()
            )));
        }
        let (cipher, nonce) = self.split(secret)?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::auth("AES-GCM tag mismatch"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(fill: u8) -> Vec<u8> {
        vec![fill; KEY_SIZE + GCM_NONCE_SIZE]
    }

    #[test]
    fn test_required_secret_bytes() {
        assert_eq!(AesGcmSecretNonce.required_secret_bytes(), 44);
    }

    #[test]
    fn test_roundtrip() {
        let aead = AesGcmSecretNonce;
        let ct = aead.encrypt(&secret(1), b"vault key").unwrap();
        assert_eq!(ct.len(), b"vault key".len() + TAG_SIZE);

        let pt = aead.decrypt(&secret(1), &ct).unwrap();
        assert_eq!(pt.as_slice(), b"vault key");
    }

    #[test]
    fn test_empty_plaintext() {
        let aead = AesGcmSecretNonce;
        let ct = aead.encrypt(&secret(3), b"").unwrap();
        assert_eq!(ct.len(), TAG_SIZE);
        assert!(aead.decrypt(&secret(3), &ct).unwrap().is_empty());
    }

    #[test]
    fn test_nonce_part_of_secret_matters() {
        let aead = AesGcmSecretNonce;
        let mut other = secret(1);
        other[KEY_SIZE] ^= 0x01;

        let ct = aead.encrypt(&secret(1), b"data").unwrap();
        let err = aead.decrypt(&other, &ct).unwrap_err();
        assert!(err.is_authentication_failure());
    }

    #[test]
    fn test_wrong_secret_length_is_precondition() {
        let aead = AesGcmSecretNonce;
        let err = aead.encrypt(&[0u8; 43], b"data").unwrap_err();
        assert!(err.is_invalid_parameter());

        let err = aead.decrypt(&[0u8; 45], &[0u8; 32]).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_short_ciphertext_is_precondition() {
        let err = AesGcmSecretNonce.decrypt(&secret(1), &[0u8; 15]).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_tampered_tag() {
        let aead = AesGcmSecretNonce;
        let mut ct = aead.encrypt(&secret(9), b"data").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 0x80;

        let err = aead.decrypt(&secret(9), &ct).unwrap_err();
        assert!(err.is_authentication_failure());
    }
}
