//! MAC wrapper over a primitive set.

use crate::{
    crypto_format::NON_RAW_PREFIX_SIZE,
    error::KeysetError,
    primitive::Mac,
    primitive_set::PrimitiveSet,
    wrapper::{self, PrimitiveWrapper, authenticated_data},
};

/// MAC across every enabled key of a keyset.
///
/// Tag layout: `prefix(primary) ‖ tag(primary)`.
#[derive(Debug, Clone)]
pub struct WrappedMac {
    set: PrimitiveSet<dyn Mac>,
}

impl PrimitiveWrapper for WrappedMac {
    type Input = dyn Mac;

    fn wrap(set: PrimitiveSet<dyn Mac>) -> Result<Self, KeysetError> {
        wrapper::ensure_primary_enabled(&set)?;
        tracing::debug!(keys = set.len(), primary_key_id = set.primary().key_id, "wrapped mac");
        Ok(Self { set })
    }
}

impl Mac for WrappedMac {
    fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>, KeysetError> {
        let primary = self.set.primary();
        let tag = primary
            .primitive
            .compute_mac(&authenticated_data(primary.output_prefix_type, data))?;

        let mut output = Vec::with_capacity(primary.prefix.len() + tag.len());
        output.extend_from_slice(&primary.prefix);
        output.extend_from_slice(&tag);
        Ok(output)
    }

    fn verify_mac(&self, tag: &[u8], data: &[u8]) -> Result<(), KeysetError> {
        // No valid tag is this short, with or without a prefix
        if tag.len() <= NON_RAW_PREFIX_SIZE {
            return Err(KeysetError::OperationFailed { operation: "verify mac" });
        }

        for (entry, payload) in self.set.candidates(tag) {
            let authenticated = authenticated_data(entry.output_prefix_type, data);
            if entry.primitive.verify_mac(payload, &authenticated).is_ok() {
                return Ok(());
            }
        }

        tracing::debug!(len = tag.len(), "no key verified mac");
        Err(KeysetError::OperationFailed { operation: "verify mac" })
    }
}
