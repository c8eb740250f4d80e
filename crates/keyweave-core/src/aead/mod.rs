//! Authenticated encryption.
//!
//! [`WrappedAead`] encrypts with the primary key and prefixes the output with
//! its identification prefix; decryption routes by prefix and falls back to
//! `Raw` keys. The built-in key type is `XChaCha20-Poly1305`.

mod wrapper;
mod xchacha20poly1305;

pub use wrapper::WrappedAead;
pub use xchacha20poly1305::{XChaCha20Poly1305KeyManager, XCHACHA20_POLY1305_TYPE_URL};

use crate::keyset::{KeyTemplate, OutputPrefixType};

/// `XChaCha20-Poly1305` key with a `Tink` prefix.
pub fn xchacha20_poly1305_template() -> KeyTemplate {
    xchacha20poly1305::template(OutputPrefixType::Tink)
}

/// `XChaCha20-Poly1305` key without a prefix.
pub fn xchacha20_poly1305_raw_template() -> KeyTemplate {
    xchacha20poly1305::template(OutputPrefixType::Raw)
}
