//! Error types for cryptographic building blocks

use thiserror::Error;

/// Errors from the raw cryptographic operations.
///
/// These never cross a keyset wrapper boundary: wrappers collapse every
/// per-key failure into one opaque error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Key material has the wrong length for the algorithm
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length (or minimum, for variable-length keys)
        expected: usize,
        /// Actual key length
        actual: usize,
    },

    /// Requested MAC tag size is outside the supported range
    #[error("invalid tag size: {size}")]
    InvalidTagSize {
        /// The requested tag size
        size: usize,
    },

    /// Input is shorter than the fixed overhead of the algorithm
    #[error("ciphertext too short: {actual} bytes, need at least {minimum}")]
    CiphertextTooShort {
        /// Actual ciphertext length
        actual: usize,
        /// Minimum valid length
        minimum: usize,
    },

    /// AEAD tag did not verify (wrong key, tampering, wrong associated data)
    #[error("authentication failed")]
    AuthenticationFailed,

    /// MAC tag did not verify
    #[error("invalid mac")]
    InvalidMac,

    /// Public key bytes do not encode a valid key
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Signature is malformed or does not verify
    #[error("invalid signature")]
    InvalidSignature,

    /// PRF output request exceeds what the construction can produce
    #[error("prf output too long: requested {requested}, maximum {maximum}")]
    OutputTooLong {
        /// Requested output length
        requested: usize,
        /// Maximum output length
        maximum: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CryptoError::InvalidKeyLength { expected: 32, actual: 16 };
        assert_eq!(err.to_string(), "invalid key length: expected 32, got 16");

        let err = CryptoError::CiphertextTooShort { actual: 3, minimum: 40 };
        assert_eq!(err.to_string(), "ciphertext too short: 3 bytes, need at least 40");
    }
}
