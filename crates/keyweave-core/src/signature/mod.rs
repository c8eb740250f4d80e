//! Digital signatures.
//!
//! A private keyset signs through [`WrappedSign`]; its public counterpart,
//! obtained with [`KeysetHandle::public_keyset_handle`], verifies through
//! [`WrappedVerify`]. Signatures carry the signing key's identification
//! prefix and `Legacy` keys sign `data ‖ 0x00`, as for MACs. The built-in key
//! type is Ed25519.
//!
//! [`KeysetHandle::public_keyset_handle`]: crate::KeysetHandle::public_keyset_handle

mod ed25519;
mod wrapper;

pub use ed25519::{
    ED25519_PRIVATE_KEY_TYPE_URL, ED25519_PUBLIC_KEY_TYPE_URL, Ed25519PrivateKeyManager,
    Ed25519PublicKeyManager,
};
pub use wrapper::{WrappedSign, WrappedVerify};

use crate::keyset::{KeyTemplate, OutputPrefixType};

/// Ed25519 private key with a `Tink` prefix.
pub fn ed25519_template() -> KeyTemplate {
    ed25519::template(OutputPrefixType::Tink)
}

/// Ed25519 private key without a prefix.
pub fn ed25519_raw_template() -> KeyTemplate {
    ed25519::template(OutputPrefixType::Raw)
}
