//! Symmetric key material and the secret-buffer type used for every derived secret

use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use cvault_core::{CryptoError, CryptoResult};

use crate::KEY_SIZE;

/// Owned buffer of secret-derived bytes. Overwritten when dropped.
pub type SecretBytes = Zeroizing<Vec<u8>>;

/// A 256-bit symmetric key. Zeroized on drop.
///
/// Used for vault key leases as well as per-file content keys.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Generate a random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::invalid(format!(
                "key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::from_bytes(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let k1 = SymmetricKey::generate();
        let k2 = SymmetricKey::generate();
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_from_slice_wrong_length() {
        let err = SymmetricKey::from_slice(&[0u8; 31]).unwrap_err();
        assert!(err.is_invalid_parameter());

        let err = SymmetricKey::from_slice(&[0u8; 33]).unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_from_slice_roundtrip() {
        let key = SymmetricKey::from_slice(&[7u8; KEY_SIZE]).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; KEY_SIZE]);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SymmetricKey::from_bytes([0xAB; KEY_SIZE]);
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("171"));
    }
}
