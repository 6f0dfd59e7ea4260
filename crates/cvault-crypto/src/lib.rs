//! cvault-crypto: the cryptographic core of the cvault vault format
//!
//! Data flow: a file is an encrypted [`header::FileHeader`] followed by
//! AEAD chunks keyed by the header's content key; every name in a directory
//! is deterministically encrypted with that directory's id as associated
//! data, and each directory id maps to a hashed storage path.
//!
//! Key hierarchy:
//! ```text
//! Masterkey (enc key + MAC key, leased per operation via MasterkeyProvider)
//!   ├── File Header: AES-256-GCM (key=enc key, nonce=header nonce)
//!   │   └── Content Key (per-file, 256-bit random)
//!   │       └── Chunk AEAD: AES-256-GCM (nonce=random_96bit, AAD=chunk_number||header_nonce)
//!   └── Names / Dir ids: AES-SIV (key=MAC key || enc key, AD=parent dir id)
//!
//! ECIES (P-384 ECDH + X9.63-SHA-256 + AES-256-GCM) transports vault keys.
//! ```

pub mod aead;
pub mod chunk;
pub mod cryptor;
pub mod dirs;
pub mod ecies;
pub mod encoding;
pub mod header;
pub mod kdf;
pub mod keys;
pub mod masterkey;
pub mod names;

pub use aead::{AesGcmSecretNonce, SecretNonceAead};
pub use chunk::FileContentCryptor;
pub use cryptor::Cryptor;
pub use dirs::{DirectoryContentCryptor, DirectoryMetadata};
pub use ecies::{EncryptedMessage, P384Ecies};
pub use header::{FileHeader, FileHeaderCryptor, HEADER_SIZE};
pub use kdf::{ansi_x963_sha256_kdf, AnsiX963Kdf, KeyDerivationFunction};
pub use keys::{SecretBytes, SymmetricKey};
pub use masterkey::{Masterkey, MasterkeyProvider};
pub use names::FileNameCryptor;

/// Size of a symmetric key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const GCM_NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
