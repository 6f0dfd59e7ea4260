pub mod config;
pub mod error;
pub mod types;

pub use error::{CryptoError, CryptoResult, CvaultError, CvaultResult};
pub use types::{FormatVersion, NameEncoding};
