//! Key derivation: ANSI X9.63 counter-mode hashing
//!
//! ```text
//! block_i = Hash(secret || BE32(i) || shared_info)    i = 1..=ceil(len / hash_len)
//! output  = (block_1 || block_2 || ...)[..len]
//! ```

use std::marker::PhantomData;

use sha2::digest::{FixedOutputReset, Output};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use cvault_core::{CryptoError, CryptoResult};

use crate::keys::SecretBytes;

/// Expands a secret into an arbitrary number of key bytes.
pub trait KeyDerivationFunction: Send + Sync {
    fn derive_key(&self, secret: &[u8], key_len: usize) -> CryptoResult<SecretBytes>;
}

/// ANSI X9.63 KDF over any fixed-output digest.
pub struct AnsiX963Kdf<D> {
    shared_info: Vec<u8>,
    _digest: PhantomData<fn() -> D>,
}

impl<D> AnsiX963Kdf<D> {
    pub fn new() -> Self {
        Self {
            shared_info: Vec::new(),
            _digest: PhantomData,
        }
    }

    /// Bind every derived key to a context label.
    pub fn with_shared_info(mut self, shared_info: impl Into<Vec<u8>>) -> Self {
        self.shared_info = shared_info.into();
        self
    }

    pub fn shared_info(&self) -> &[u8] {
        &self.shared_info
    }
}

impl<D> Default for AnsiX963Kdf<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for AnsiX963Kdf<D> {
    fn clone(&self) -> Self {
        Self {
            shared_info: self.shared_info.clone(),
            _digest: PhantomData,
        }
    }
}

impl<D> std::fmt::Debug for AnsiX963Kdf<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiX963Kdf")
            .field("shared_info_len", &self.shared_info.len())
            .finish()
    }
}

impl<D: Digest + FixedOutputReset> KeyDerivationFunction for AnsiX963Kdf<D> {
    fn derive_key(&self, secret: &[u8], key_len: usize) -> CryptoResult<SecretBytes> {
        let hash_len = <D as Digest>::output_size();
        let blocks = key_len.div_ceil(hash_len);
        // counter is 32 bits: at most hash_len * (2^32 - 1) output bytes
        let blocks = u32::try_from(blocks).map_err(|_| {
            CryptoError::invalid(format!("requested key length {key_len} exceeds X9.63 limit"))
        })?;

        let mut okm = Zeroizing::new(Vec::with_capacity(blocks as usize * hash_len));
        let mut block = Output::<D>::default();
        // One hasher for all blocks; its internal block buffer is the only
        // secret-derived state not zeroized here.
        let mut hasher = <D as Digest>::new();
        for counter in 1..=blocks {
            Digest::update(&mut hasher, secret);
            Digest::update(&mut hasher, counter.to_be_bytes());
            Digest::update(&mut hasher, &self.shared_info);
            Digest::finalize_into_reset(&mut hasher, &mut block);
            okm.extend_from_slice(&block);
        }
        block.as_mut_slice().zeroize();

        okm.truncate(key_len);
        Ok(okm)
    }
}

/// X9.63 with SHA-256 and empty shared info.
pub fn ansi_x963_sha256_kdf() -> AnsiX963Kdf<Sha256> {
    AnsiX963Kdf::new()
}
