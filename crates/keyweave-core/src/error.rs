//! Error types for keyset resolution, wrapping and derivation.
//!
//! Every failure maps onto one [`ErrorKind`]. Construction and validation
//! errors carry enough detail to fix a misconfigured keyset; operation
//! failures from wrapped primitives carry none, so a caller probing with
//! malformed ciphertexts learns nothing about which key rejected them.

use keyweave_crypto::CryptoError;
use thiserror::Error;

use crate::keyset::KeyId;

/// Coarse classification of [`KeysetError`].
///
/// No error is retried inside this crate. Derivation errors in particular are
/// final: derivation is deterministic, so the same inputs fail the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Key material could not be turned into a primitive
    KeyConstruction,
    /// Keyset or primitive set has the wrong shape for the request
    Validation,
    /// A wrapped operation found no key that succeeds
    OperationFailure,
    /// Target key type cannot be derived from a randomness stream
    UnsupportedDerivationType,
    /// Derivation was attempted and failed
    DerivationFailed,
    /// Registry refused a registration or key generation request
    Registry,
}

/// Errors from keyset handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeysetError {
    /// A single key could not be constructed; aborts the whole primitive set
    #[error("cannot construct key {key_id}: {reason}")]
    KeyConstruction {
        /// Key that failed
        key_id: KeyId,
        /// Underlying cause
        reason: String,
    },

    /// No key manager is registered for this type URL
    #[error("no key manager registered for {type_url}")]
    UnknownKeyType {
        /// Requested type URL
        type_url: String,
    },

    /// Serialized key material or parameters could not be parsed
    #[error("invalid key material: {reason}")]
    InvalidKeyMaterial {
        /// What was wrong
        reason: String,
    },

    /// Keyset violates a structural invariant
    #[error("invalid keyset: {reason}")]
    InvalidKeyset {
        /// What was wrong
        reason: String,
    },

    /// Key template cannot be used for the request
    #[error("invalid key template: {reason}")]
    InvalidTemplate {
        /// What was wrong
        reason: String,
    },

    /// Primitive set has the wrong shape for a capability
    #[error("{capability} validation failed: {reason}")]
    Validation {
        /// Capability being validated
        capability: &'static str,
        /// What was wrong
        reason: String,
    },

    /// Key cannot produce an identification prefix
    #[error("key {key_id} has an unknown output prefix type")]
    UnknownPrefixType {
        /// Offending key
        key_id: KeyId,
    },

    /// Key type has no public counterpart
    #[error("key type {type_url} is not a private key type")]
    NotPrivateKey {
        /// Type URL of the offending key
        type_url: String,
    },

    /// Key id does not exist in the keyset
    #[error("key {key_id} not found")]
    KeyNotFound {
        /// Requested key id
        key_id: KeyId,
    },

    /// Operation is not allowed on the primary key
    #[error("cannot {operation} the primary key {key_id}")]
    PrimaryKeyOperation {
        /// Attempted operation
        operation: &'static str,
        /// Primary key id
        key_id: KeyId,
    },

    /// Wrapped operation failed; carries no per-key detail
    #[error("{operation} failed")]
    OperationFailed {
        /// Operation name
        operation: &'static str,
    },

    /// Key type has no derivation support
    #[error("key type {type_url} does not support key derivation")]
    UnsupportedDerivationType {
        /// Type URL of the derived key template
        type_url: String,
    },

    /// Derivation could not produce key material
    #[error("key derivation failed: {reason}")]
    DerivationFailed {
        /// Underlying cause
        reason: String,
    },

    /// A different manager is already registered for the type URL
    #[error("a different key manager is already registered for {type_url}")]
    ManagerConflict {
        /// Contested type URL
        type_url: String,
    },

    /// New key generation was disallowed earlier and cannot be re-enabled
    #[error("new key generation for {type_url} was disallowed and cannot be re-enabled")]
    NewKeyAllowedConflict {
        /// Type URL
        type_url: String,
    },

    /// Registry forbids creating new keys of this type
    #[error("new key generation is not allowed for {type_url}")]
    NewKeyNotAllowed {
        /// Type URL
        type_url: String,
    },

    /// Underlying cryptographic failure from a single-key primitive
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl KeysetError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::KeyConstruction { .. }
            | Self::UnknownKeyType { .. }
            | Self::InvalidKeyMaterial { .. } => ErrorKind::KeyConstruction,
            Self::InvalidKeyset { .. }
            | Self::InvalidTemplate { .. }
            | Self::Validation { .. }
            | Self::UnknownPrefixType { .. }
            | Self::NotPrivateKey { .. }
            | Self::KeyNotFound { .. }
            | Self::PrimaryKeyOperation { .. } => ErrorKind::Validation,
            Self::OperationFailed { .. } | Self::Crypto(_) => ErrorKind::OperationFailure,
            Self::UnsupportedDerivationType { .. } => ErrorKind::UnsupportedDerivationType,
            Self::DerivationFailed { .. } => ErrorKind::DerivationFailed,
            Self::ManagerConflict { .. }
            | Self::NewKeyAllowedConflict { .. }
            | Self::NewKeyNotAllowed { .. } => ErrorKind::Registry,
        }
    }
}
