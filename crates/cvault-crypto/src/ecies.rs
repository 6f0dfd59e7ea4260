//! Elliptic-curve integrated encryption scheme for exchanging vault keys
//!
//! ```text
//! sender:    (e, E) = fresh ephemeral key pair
//!            z      = ECDH(e, recipient_public)
//!            s      = KDF(z, key_len + nonce_len)        e and z dropped here
//!            c      = AEAD(key = s[..key_len], nonce = s[key_len..], m)
//!            send {E, c}
//! recipient: z = ECDH(recipient_secret, E), same derivation, open c
//! ```
//!
//! A static key pair must never stand in for the ephemeral one: the derived
//! secret fixes the AEAD nonce, so reuse would repeat (key, nonce) pairs.

use p384::ecdh::EphemeralSecret;
use p384::elliptic_curve::sec1::ToEncodedPoint;
use p384::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::Sha256;

use cvault_core::{CryptoError, CryptoResult};

use crate::aead::{AesGcmSecretNonce, SecretNonceAead};
use crate::kdf::{AnsiX963Kdf, KeyDerivationFunction};
use crate::keys::SecretBytes;

/// An ECIES ciphertext together with the sender's ephemeral public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedMessage {
    ephemeral_public_key: PublicKey,
    ciphertext: Vec<u8>,
}

impl EncryptedMessage {
    pub fn new(ephemeral_public_key: PublicKey, ciphertext: Vec<u8>) -> Self {
        Self {
            ephemeral_public_key,
            ciphertext,
        }
    }

    /// Rebuild a received message from its SEC1-encoded ephemeral point.
    pub fn from_parts(ephemeral_public_key: &[u8], ciphertext: Vec<u8>) -> CryptoResult<Self> {
        Ok(Self::new(public_key_from_sec1(ephemeral_public_key)?, ciphertext))
    }

    pub fn ephemeral_public_key(&self) -> &PublicKey {
        &self.ephemeral_public_key
    }

    /// Uncompressed SEC1 encoding of the ephemeral public key.
    pub fn ephemeral_public_key_bytes(&self) -> Vec<u8> {
        public_key_to_sec1(&self.ephemeral_public_key)
    }

    /// Raw AEAD output (`ciphertext || tag`).
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

/// ECIES over P-384 with pluggable KDF and secret-nonce AEAD.
#[derive(Debug, Clone)]
pub struct Ecies<K, A> {
    kdf: K,
    aead: A,
}

/// The named preset: P-384, X9.63-SHA-256, AES-256-GCM (44-byte secret).
pub type P384Ecies = Ecies<AnsiX963Kdf<Sha256>, AesGcmSecretNonce>;

impl P384Ecies {
    pub fn p384_sha256_aes_gcm() -> Self {
        Self::new(AnsiX963Kdf::new(), AesGcmSecretNonce)
    }
}

impl<K: KeyDerivationFunction, A: SecretNonceAead> Ecies<K, A> {
    pub fn new(kdf: K, aead: A) -> Self {
        Self { kdf, aead }
    }

    /// Encrypt `plaintext` for the holder of `recipient`'s secret key.
    pub fn encrypt(
        &self,
        recipient: &PublicKey,
        plaintext: &[u8],
    ) -> CryptoResult<EncryptedMessage> {
        let ephemeral = EphemeralSecret::random(&mut OsRng);
        let ephemeral_public_key = ephemeral.public_key();
        let shared = ephemeral.diffie_hellman(recipient);
        drop(ephemeral);

        let secret = self
            .kdf
            .derive_key(shared.raw_secret_bytes(), self.aead.required_secret_bytes())?;
        drop(shared);

        let ciphertext = self.aead.encrypt(&secret, plaintext)?;
        tracing::debug!(len = plaintext.len(), "ECIES message sealed");
        Ok(EncryptedMessage::new(ephemeral_public_key, ciphertext))
    }

    /// Decrypt a message addressed to `recipient`.
    pub fn decrypt(
        &self,
        recipient: &SecretKey,
        message: &EncryptedMessage,
    ) -> CryptoResult<SecretBytes> {
        let shared = p384::ecdh::diffie_hellman(
            recipient.to_nonzero_scalar(),
            message.ephemeral_public_key.as_affine(),
        );
        let secret = self
            .kdf
            .derive_key(shared.raw_secret_bytes(), self.aead.required_secret_bytes())?;
        drop(shared);

        self.aead
            .decrypt(&secret, &message.ciphertext)
            .inspect_err(|e| {
                if e.is_authentication_failure() {
                    tracing::warn!("ECIES message failed authentication");
                }
            })
    }
}

/// Generate a long-term recipient key pair.
pub fn generate_key_pair() -> (SecretKey, PublicKey) {
    let secret = SecretKey::random(&mut OsRng);
    let public = secret.public_key();
    (secret, public)
}

/// Parse a big-endian P-384 scalar (48 bytes).
pub fn secret_key_from_bytes(bytes: &[u8]) -> CryptoResult<SecretKey> {
    SecretKey::from_slice(bytes)
        .map_err(|_| CryptoError::invalid("not a valid P-384 secret key"))
}

/// Parse a SEC1-encoded (compressed or uncompressed) P-384 point.
pub fn public_key_from_sec1(bytes: &[u8]) -> CryptoResult<PublicKey> {
    PublicKey::from_sec1_bytes(bytes)
        .map_err(|_| CryptoError::invalid("not a valid SEC1-encoded P-384 public key"))
}

pub fn public_key_to_sec1(key: &PublicKey) -> Vec<u8> {
    key.to_encoded_point(false).as_bytes().to_vec()
}
