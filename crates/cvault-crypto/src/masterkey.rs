//! Vault masterkey and the leasing interface cryptors use to reach it
//!
//! Cryptors never hold vault keys. Each operation asks its provider for a
//! lease: an owned [`SymmetricKey`] copy that is zeroized when the operation
//! drops it, on success and failure alike.

use zeroize::Zeroizing;

use cvault_core::{CryptoError, CryptoResult};

use crate::keys::{SecretBytes, SymmetricKey};
use crate::KEY_SIZE;

/// Length of a raw masterkey: encryption key followed by MAC key.
pub const MASTERKEY_SIZE: usize = 2 * KEY_SIZE;

/// Source of scoped vault keys.
pub trait MasterkeyProvider: Send + Sync {
    /// Lease the vault encryption key for the duration of one operation.
    fn encryption_key(&self) -> CryptoResult<SymmetricKey>;

    /// Lease the vault MAC key for the duration of one operation.
    fn mac_key(&self) -> CryptoResult<SymmetricKey>;
}

/// The pair of long-lived vault keys.
#[derive(Clone)]
pub struct Masterkey {
    enc: SymmetricKey,
    mac: SymmetricKey,
}

impl Masterkey {
    pub fn new(enc: SymmetricKey, mac: SymmetricKey) -> Self {
        Self { enc, mac }
    }

    pub fn generate() -> Self {
        Self::new(SymmetricKey::generate(), SymmetricKey::generate())
    }

    /// Build from `enc_key ‖ mac_key` (64 bytes).
    pub fn from_raw(raw: &[u8]) -> CryptoResult<Self> {
        if raw.len() != MASTERKEY_SIZE {
            return Err(CryptoError::invalid(format!(
                "raw masterkey must be {MASTERKEY_SIZE} bytes, got {}",
                raw.len()
            )));
        }
        let (enc, mac) = raw.split_at(KEY_SIZE);
        Ok(Self::new(
            SymmetricKey::from_slice(enc)?,
            SymmetricKey::from_slice(mac)?,
        ))
    }

    /// Export as `enc_key ‖ mac_key`.
    pub fn to_raw(&self) -> SecretBytes {
        let mut raw = Zeroizing::new(Vec::with_capacity(MASTERKEY_SIZE));
        raw.extend_from_slice(self.enc.as_bytes());
        raw.extend_from_slice(self.mac.as_bytes());
        raw
    }
}

impl MasterkeyProvider for Masterkey {
    fn encryption_key(&self) -> CryptoResult<SymmetricKey> {
        Ok(self.enc.clone())
    }

    fn mac_key(&self) -> CryptoResult<SymmetricKey> {
        Ok(self.mac.clone())
    }
}

impl std::fmt::Debug for Masterkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Masterkey")
            .field("enc", &"[REDACTED]")
            .field("mac", &"[REDACTED]")
            .finish()
    }
}
