//! Text encodings for encrypted names and hashed directory ids

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use data_encoding::BASE32;

pub use cvault_core::NameEncoding;

pub(crate) fn encode(encoding: NameEncoding, data: &[u8]) -> String {
    match encoding {
        NameEncoding::Base64url => URL_SAFE.encode(data),
        NameEncoding::Base64 => STANDARD.encode(data),
        NameEncoding::Base32 => BASE32.encode(data),
    }
}

/// `None` on any malformed input; callers decide the error kind.
pub(crate) fn decode(encoding: NameEncoding, text: &str) -> Option<Vec<u8>> {
    match encoding {
        NameEncoding::Base64url => URL_SAFE.decode(text).ok(),
        NameEncoding::Base64 => STANDARD.decode(text).ok(),
        NameEncoding::Base32 => BASE32.decode(text.as_bytes()).ok(),
    }
}
