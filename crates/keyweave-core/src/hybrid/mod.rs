//! Hybrid (public-key) encryption.
//!
//! A public keyset encrypts through [`WrappedHybridEncrypt`]; the private
//! keyset it came from decrypts through [`WrappedHybridDecrypt`]. Routing is
//! the same as for AEAD: the primary key's prefix on the way out, prefix
//! matches then `Raw` keys on the way in. `context_info` binds a ciphertext to
//! its use the way associated data does for AEAD. The built-in key type is
//! X25519 with HKDF-SHA256 and `XChaCha20-Poly1305`.

mod wrapper;
mod x25519;

pub use wrapper::{WrappedHybridDecrypt, WrappedHybridEncrypt};
pub use x25519::{
    X25519_HYBRID_PRIVATE_KEY_TYPE_URL, X25519_HYBRID_PUBLIC_KEY_TYPE_URL,
    X25519HybridPrivateKeyManager, X25519HybridPublicKeyManager,
};

use crate::keyset::{KeyTemplate, OutputPrefixType};

/// X25519 hybrid private key with a `Tink` prefix.
pub fn x25519_xchacha20_poly1305_template() -> KeyTemplate {
    x25519::template(OutputPrefixType::Tink)
}

/// X25519 hybrid private key without a prefix.
pub fn x25519_xchacha20_poly1305_raw_template() -> KeyTemplate {
    x25519::template(OutputPrefixType::Raw)
}
