//! use certforge::error::CertForgeError;

use thiserror::Error;

/// Represents errors that can occur while issuing certificates.
///
/// Every error is terminal for the request in progress: a build either yields
/// a complete certificate or one of these.
#[derive(Debug, Error, Clone)]
pub enum CertForgeError {
    /// The signature algorithm name is unknown, or its cipher family has no
    /// working key generator or signer.
    #[error("Unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The certificate request is incomplete or inconsistent.
    #[error("Invalid certificate request: {0}")]
    InvalidRequest(String),

    /// The named curve is not present in any curve registry, or it has no key
    /// generator.
    #[error("Unsupported curve: {0}")]
    UnsupportedCurve(String),

    /// The private key of an issuer certificate could not be recovered.
    #[error("Failed to recover private key: {0}")]
    KeyRecoveryFailure(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error while producing a signature.
    #[error("Signing error: {0}")]
    SigningError(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, CertForgeError>;

impl From<der::Error> for CertForgeError {
    /// Converts a `der::Error` into a `CertForgeError`.
    fn from(err: der::Error) -> Self {
        CertForgeError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for CertForgeError {
    fn from(err: rsa::Error) -> Self {
        CertForgeError::SigningError(err.to_string())
    }
}

impl From<pkcs8::Error> for CertForgeError {
    fn from(err: pkcs8::Error) -> Self {
        CertForgeError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CertForgeError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CertForgeError::EncodingError(err.to_string())
    }
}

impl From<signature::Error> for CertForgeError {
    fn from(err: signature::Error) -> Self {
        CertForgeError::SigningError(err.to_string())
    }
}
