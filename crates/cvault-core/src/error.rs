use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

pub type CvaultResult<T> = Result<T, CvaultError>;

/// Failure of a cryptographic operation.
///
/// Callers must treat `Authentication` as a possible tampering event and
/// `InvalidParameter` as a usage error. Neither is ever retried internally.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Precondition violation: malformed sizes, wrong key material,
    /// unsupported flag combinations, malformed framing.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Tag mismatch or any other integrity failure.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A state that is unreachable when the caller contract is honored.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl CryptoError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter(_))
    }
}

#[derive(Debug, Error)]
pub enum CvaultError {
    #[error("config error: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinguishable() {
        let auth = CryptoError::auth("tag mismatch");
        let invalid = CryptoError::invalid("too short");

        assert!(auth.is_authentication_failure());
        assert!(!auth.is_invalid_parameter());
        assert!(invalid.is_invalid_parameter());
        assert!(!invalid.is_authentication_failure());
        assert!(!CryptoError::internal("x").is_authentication_failure());
    }

    #[test]
    fn crypto_error_converts_into_cvault_error() {
        let err: CvaultError = CryptoError::auth("tag mismatch").into();
        assert!(matches!(
            err,
            CvaultError::Crypto(CryptoError::Authentication(_))
        ));
        assert_eq!(
            err.to_string(),
            "crypto error: authentication failed: tag mismatch"
        );
    }
}
