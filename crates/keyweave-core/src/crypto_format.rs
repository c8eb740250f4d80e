//! Identification prefixes.
//!
//! A prefix routes a ciphertext or tag to the keys that may have produced it,
//! so decryption does not have to try every key in the keyset.
//!
//! ```text
//! Tink:            0x01 ‖ key_id (u32, big-endian)
//! Legacy/Crunchy:  0x00 ‖ key_id (u32, big-endian)
//! Raw:             (empty)
//! ```
//!
//! Key ids are not globally unique, so two keys can share a prefix. Lookups
//! therefore always return a list of candidates.

use crate::{
    error::KeysetError,
    keyset::{KeyId, OutputPrefixType},
};

/// Length of every non-empty prefix
pub const NON_RAW_PREFIX_SIZE: usize = 5;

/// Length of the `Raw` prefix
pub const RAW_PREFIX_SIZE: usize = 0;

/// First byte of a `Tink` prefix
pub const TINK_START_BYTE: u8 = 0x01;

/// First byte of a `Legacy` or `Crunchy` prefix
pub const LEGACY_START_BYTE: u8 = 0x00;

/// Identification prefix for a key.
///
/// # Errors
///
/// - `UnknownPrefixType`: `output_prefix_type` is `Unknown`
pub fn output_prefix(
    key_id: KeyId,
    output_prefix_type: OutputPrefixType,
) -> Result<Vec<u8>, KeysetError> {
    let start_byte = match output_prefix_type {
        OutputPrefixType::Raw => return Ok(Vec::new()),
        OutputPrefixType::Tink => TINK_START_BYTE,
        OutputPrefixType::Legacy | OutputPrefixType::Crunchy => LEGACY_START_BYTE,
        OutputPrefixType::Unknown => return Err(KeysetError::UnknownPrefixType { key_id }),
    };

    let mut prefix = Vec::with_capacity(NON_RAW_PREFIX_SIZE);
    prefix.push(start_byte);
    prefix.extend_from_slice(&key_id.to_be_bytes());
    Ok(prefix)
}
