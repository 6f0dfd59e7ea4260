//! AES-SIV filename encryption and directory-id hashing
//!
//! Deterministic encryption (same name + key + associated data = same
//! ciphertext) is required for names because directory listings must be
//! stable across repeated encryptions. The parent directory id goes in as
//! associated data, so an encrypted name cannot be moved to another
//! directory without re-encryption.

use std::sync::Arc;

use aes_siv::{siv::Aes256Siv, KeyInit};
use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use cvault_core::{CryptoError, CryptoResult, NameEncoding};

use crate::encoding;
use crate::masterkey::MasterkeyProvider;
use crate::{KEY_SIZE, TAG_SIZE};

/// Encrypts names and hashes directory ids under the vault keys.
#[derive(Clone)]
pub struct FileNameCryptor {
    masterkey: Arc<dyn MasterkeyProvider>,
    encoding: NameEncoding,
}

impl FileNameCryptor {
    pub fn new(masterkey: Arc<dyn MasterkeyProvider>, encoding: NameEncoding) -> Self {
        Self {
            masterkey,
            encoding,
        }
    }

    pub fn encoding(&self) -> NameEncoding {
        self.encoding
    }

    /// Encrypt a name bound to `associated_data` (usually the parent dir id).
    ///
    /// The caller appends the format suffix.
    pub fn encrypt_filename(
        &self,
        cleartext_name: &str,
        associated_data: &[&[u8]],
    ) -> CryptoResult<String> {
        self.encrypt_filename_with(self.encoding, cleartext_name, associated_data)
    }

    pub fn encrypt_filename_with(
        &self,
        encoding: NameEncoding,
        cleartext_name: &str,
        associated_data: &[&[u8]],
    ) -> CryptoResult<String> {
        let ciphertext = self.siv_encrypt(cleartext_name.as_bytes(), associated_data)?;
        Ok(encoding::encode(encoding, &ciphertext))
    }

    /// Reverse [`Self::encrypt_filename`]. Every failure is an authentication failure.
    pub fn decrypt_filename(
        &self,
        ciphertext_name: &str,
        associated_data: &[&[u8]],
    ) -> CryptoResult<String> {
        self.decrypt_filename_with(self.encoding, ciphertext_name, associated_data)
    }

    pub fn decrypt_filename_with(
        &self,
        encoding: NameEncoding,
        ciphertext_name: &str,
        associated_data: &[&[u8]],
    ) -> CryptoResult<String> {
        let ciphertext = encoding::decode(encoding, ciphertext_name)
            .ok_or_else(|| CryptoError::auth("encrypted name is not validly encoded"))?;
        if ciphertext.len() < TAG_SIZE {
            return Err(CryptoError::auth("encrypted name is too short"));
        }

        let mut siv = self.siv()?;
        let plaintext = siv.decrypt(associated_data, &ciphertext).map_err(|_| {
            tracing::warn!("file name failed authentication");
            CryptoError::auth("file name integrity check failed")
        })?;

        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::auth("decrypted name is not UTF-8"))
    }

    /// Storage path component for a directory id: base32(SHA-1(SIV(dir_id))).
    pub fn hash_directory_id(&self, dir_id: &[u8]) -> CryptoResult<String> {
        let ciphertext = self.siv_encrypt(dir_id, &[])?;
        let digest = Sha1::digest(&ciphertext);
        Ok(encoding::encode(NameEncoding::Base32, &digest))
    }

    fn siv_encrypt(&self, plaintext: &[u8], associated_data: &[&[u8]]) -> CryptoResult<Vec<u8>> {
        let mut siv = self.siv()?;
        siv.encrypt(associated_data, plaintext)
            .map_err(|_| CryptoError::internal("AES-SIV encryption failed"))
    }

    /// AES-SIV keyed with `mac_key || enc_key` (S2V key first, CTR key second).
    fn siv(&self) -> CryptoResult<Aes256Siv> {
        let enc_key = self.masterkey.encryption_key()?;
        let mac_key = self.masterkey.mac_key()?;

        let mut double_key = Zeroizing::new([0u8; 2 * KEY_SIZE]);
        double_key[..KEY_SIZE].copy_from_slice(mac_key.as_bytes());
        double_key[KEY_SIZE..].copy_from_slice(enc_key.as_bytes());

        Aes256Siv::new_from_slice(double_key.as_slice())
            .map_err(|_| CryptoError::internal("AES-SIV rejected a 64-byte key"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::masterkey::Masterkey;
    use proptest::prelude::*;

    fn cryptor() -> FileNameCryptor {
        let mk = Masterkey::from_raw(&[0x55u8; 64]).unwrap();
        FileNameCryptor::new(Arc::new(mk), NameEncoding::Base64url)
    }

    #[test]
    fn test_encrypt_decrypt_name_roundtrip() {
        let c = cryptor();
        let encrypted = c.encrypt_filename("my-photo.jpg", &[b"dir-1".as_slice()]).unwrap();
        let decrypted = c.decrypt_filename(&encrypted, &[b"dir-1".as_slice()]).unwrap();

        assert_eq!(decrypted, "my-photo.jpg");
    }

    #[test]
    fn test_deterministic_encryption() {
        let c = cryptor();
        let enc1 = c.encrypt_filename("report.pdf", &[b"dir".as_slice()]).unwrap();
        let enc2 = c.encrypt_filename("report.pdf", &[b"dir".as_slice()]).unwrap();

        assert_eq!(enc1, enc2, "AES-SIV must be deterministic");
    }

    #[test]
    fn test_ciphertext_length_is_name_plus_tag() {
        let c = cryptor();
        let encrypted = c.encrypt_filename("abcde", &[]).unwrap();
        let raw = encoding::decode(NameEncoding::Base64url, &encrypted).unwrap();
        assert_eq!(raw.len(), 5 + TAG_SIZE);
    }

    #[test]
    fn test_different_names_different_ciphertext() {
        let c = cryptor();
        let enc1 = c.encrypt_filename("file_a.txt", &[b"".as_slice()]).unwrap();
        let enc2 = c.encrypt_filename("file_b.txt", &[b"".as_slice()]).unwrap();

        assert_ne!(enc1, enc2);
    }

    #[test]
    fn test_different_directories_different_ciphertext() {
        let c = cryptor();
        let enc1 = c.encrypt_filename("same.txt", &[b"dir-a".as_slice()]).unwrap();
        let enc2 = c.encrypt_filename("same.txt", &[b"dir-b".as_slice()]).unwrap();

        assert_ne!(enc1, enc2);
    }

    #[test]
    fn test_decrypt_wrong_directory() {
        let c = cryptor();
        let encrypted = c.encrypt_filename("secret.txt", &[b"dir-a".as_slice()]).unwrap();
        let err = c.decrypt_filename(&encrypted, &[b"dir-b".as_slice()]).unwrap_err();

        assert!(err.is_authentication_failure());
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let encrypted = cryptor().encrypt_filename("secret.txt", &[]).unwrap();
        let other = FileNameCryptor::new(Arc::new(Masterkey::generate()), NameEncoding::Base64url);

        assert!(other
            .decrypt_filename(&encrypted, &[])
            .unwrap_err()
            .is_authentication_failure());
    }

    #[test]
    fn test_malformed_encoding_is_authentication_failure() {
        let c = cryptor();
        for input in ["!!!!", "", "AAAA"] {
            let err = c.decrypt_filename(input, &[]).unwrap_err();
            assert!(err.is_authentication_failure(), "input {input:?}");
        }
    }

    #[test]
    fn test_tampered_name() {
        let c = cryptor();
        let encrypted = c.encrypt_filename("secret.txt", &[b"d".as_slice()]).unwrap();
        let mut raw = encoding::decode(NameEncoding::Base64url, &encrypted).unwrap();
        raw[TAG_SIZE] ^= 0x01;
        let tampered = encoding::encode(NameEncoding::Base64url, &raw);

        assert!(c
            .decrypt_filename(&tampered, &[b"d".as_slice()])
            .unwrap_err()
            .is_authentication_failure());
    }

    #[test]
    fn test_alternative_encoding() {
        let c = cryptor();
        let encrypted = c
            .encrypt_filename_with(NameEncoding::Base32, "notes.md", &[b"d".as_slice()])
            .unwrap();
        assert!(encrypted
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ('2'..='7').contains(&ch) || ch == '='));

        let decrypted = c
            .decrypt_filename_with(NameEncoding::Base32, &encrypted, &[b"d".as_slice()])
            .unwrap();
        assert_eq!(decrypted, "notes.md");
    }

    #[test]
    fn test_unicode_filename() {
        let c = cryptor();
        let name = "résumé – 東京 🗂.pdf";

        let encrypted = c.encrypt_filename(name, &[b"dir".as_slice()]).unwrap();
        assert_eq!(c.decrypt_filename(&encrypted, &[b"dir".as_slice()]).unwrap(), name);
    }

    #[test]
    fn test_hash_directory_id_shape() {
        let c = cryptor();
        let hash = c.hash_directory_id(b"").unwrap();

        assert_eq!(hash.len(), 32);
        assert!(hash
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ('2'..='7').contains(&ch)));
        assert_eq!(hash, c.hash_directory_id(b"").unwrap());
        assert_ne!(hash, c.hash_directory_id(b"other").unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn name_roundtrip(name in "\\PC{0,64}", dir_id in "[a-f0-9-]{0,36}") {
            let c = cryptor();
            let encrypted = c.encrypt_filename(&name, &[dir_id.as_bytes()]).unwrap();
            let decrypted = c.decrypt_filename(&encrypted, &[dir_id.as_bytes()]).unwrap();
            prop_assert_eq!(decrypted, name);
        }
    }
}
