//! Pseudorandom functions.
//!
//! PRF output carries no identification prefix, so both wrappers require
//! `Raw` keys. [`PrfSet`] exposes every key by id; [`WrappedStreamingPrf`]
//! requires exactly one key. The built-in key type is HKDF-SHA256, which
//! provides both `Prf` and `StreamingPrf`.

mod hkdf;
mod wrapper;

pub use hkdf::{HKDF_PRF_TYPE_URL, HkdfPrfKeyManager};
pub use wrapper::{PrfSet, WrappedStreamingPrf};

pub(crate) use hkdf::HkdfPrf;

use crate::keyset::KeyTemplate;

/// HKDF-SHA256 PRF with a 32-byte key and no salt.
pub fn hkdf_sha256_template() -> KeyTemplate {
    hkdf::template(32, Vec::new())
}

/// HKDF-SHA256 PRF with a `key_size`-byte key and a fixed `salt`.
pub fn hkdf_sha256_template_with_salt(key_size: u32, salt: Vec<u8>) -> KeyTemplate {
    hkdf::template(key_size, salt)
}
