//! Primitive wrappers.
//!
//! A wrapper turns a capability-narrowed [`PrimitiveSet`] into one object
//! implementing that capability across every key. Shape checks happen in
//! [`PrimitiveWrapper::wrap`], so a misconfigured keyset fails when the
//! primitive is obtained rather than on first use.

use std::borrow::Cow;

use crate::{
    error::KeysetError,
    keyset::{KeyStatus, OutputPrefixType},
    primitive::Capability,
    primitive_set::PrimitiveSet,
};

/// Byte appended to the data authenticated by `Legacy` keys
const LEGACY_DATA_SUFFIX: u8 = 0x00;

/// Capability-specific wrapper over a primitive set.
pub trait PrimitiveWrapper: Sized {
    /// Capability every entry must provide
    type Input: Capability + ?Sized;

    /// Validate the set and build the wrapped primitive.
    ///
    /// # Errors
    ///
    /// - `Validation`: the set has the wrong shape for this capability
    fn wrap(set: PrimitiveSet<Self::Input>) -> Result<Self, KeysetError>;
}

/// The primary entry must be `Enabled`.
pub(crate) fn ensure_primary_enabled<P: Capability + ?Sized>(
    set: &PrimitiveSet<P>,
) -> Result<(), KeysetError> {
    let primary = set.primary();
    if primary.status == KeyStatus::Enabled {
        Ok(())
    } else {
        Err(KeysetError::Validation {
            capability: P::NAME,
            reason: format!("primary key {} is not enabled", primary.key_id),
        })
    }
}

/// Every entry must use the `Raw` discipline.
pub(crate) fn ensure_all_raw<P: Capability + ?Sized>(
    set: &PrimitiveSet<P>,
) -> Result<(), KeysetError> {
    match set.entries().iter().find(|entry| entry.output_prefix_type != OutputPrefixType::Raw) {
        Some(entry) => Err(KeysetError::Validation {
            capability: P::NAME,
            reason: format!("key {} must use the raw output prefix type", entry.key_id),
        }),
        None => Ok(()),
    }
}

/// Data actually authenticated or signed by a key of `output_prefix_type`.
/// `Legacy` keys cover `data ‖ 0x00`.
pub(crate) fn authenticated_data(
    output_prefix_type: OutputPrefixType,
    data: &[u8],
) -> Cow<'_, [u8]> {
    if output_prefix_type == OutputPrefixType::Legacy {
        let mut suffixed = Vec::with_capacity(data.len() + 1);
        suffixed.extend_from_slice(data);
        suffixed.push(LEGACY_DATA_SUFFIX);
        Cow::Owned(suffixed)
    } else {
        Cow::Borrowed(data)
    }
}
