//! Message authentication codes.
//!
//! [`WrappedMac`] tags with the primary key and prefixes the tag with its
//! identification prefix. `Legacy` keys authenticate `data ‖ 0x00` instead of
//! `data`. The built-in key type is HMAC-SHA256 with truncated tags.

mod hmac;
mod wrapper;

pub use hmac::{HMAC_TYPE_URL, HmacKeyManager};
pub use wrapper::WrappedMac;

use crate::keyset::{KeyTemplate, OutputPrefixType};

/// HMAC-SHA256 key of `key_size` bytes producing `tag_size`-byte tags, with a
/// `Tink` prefix.
pub fn hmac_sha256_template(key_size: u32, tag_size: u32) -> KeyTemplate {
    hmac::template(key_size, tag_size, OutputPrefixType::Tink)
}

/// HMAC-SHA256 template without a prefix.
pub fn hmac_sha256_raw_template(key_size: u32, tag_size: u32) -> KeyTemplate {
    hmac::template(key_size, tag_size, OutputPrefixType::Raw)
}
