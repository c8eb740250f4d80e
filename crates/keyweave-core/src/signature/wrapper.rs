//! Sign and verify wrappers over primitive sets.

use crate::{
    crypto_format::NON_RAW_PREFIX_SIZE,
    error::KeysetError,
    primitive::{PublicKeySign, PublicKeyVerify},
    primitive_set::PrimitiveSet,
    wrapper::{self, PrimitiveWrapper, authenticated_data},
};

/// Signs with the primary key of a private keyset.
///
/// Signature layout: `prefix(primary) ‖ signature(primary)`.
#[derive(Debug, Clone)]
pub struct WrappedSign {
    set: PrimitiveSet<dyn PublicKeySign>,
}

impl PrimitiveWrapper for WrappedSign {
    type Input = dyn PublicKeySign;

    fn wrap(set: PrimitiveSet<dyn PublicKeySign>) -> Result<Self, KeysetError> {
        wrapper::ensure_primary_enabled(&set)?;
        tracing::debug!(keys = set.len(), primary_key_id = set.primary().key_id, "wrapped signer");
        Ok(Self { set })
    }
}

impl PublicKeySign for WrappedSign {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeysetError> {
        let primary = self.set.primary();
        let signature =
            primary.primitive.sign(&authenticated_data(primary.output_prefix_type, data))?;

        let mut output = Vec::with_capacity(primary.prefix.len() + signature.len());
        output.extend_from_slice(&primary.prefix);
        output.extend_from_slice(&signature);
        Ok(output)
    }
}

/// Verifies signatures made by any enabled key of a public keyset.
#[derive(Debug, Clone)]
pub struct WrappedVerify {
    set: PrimitiveSet<dyn PublicKeyVerify>,
}

impl PrimitiveWrapper for WrappedVerify {
    type Input = dyn PublicKeyVerify;

    fn wrap(set: PrimitiveSet<dyn PublicKeyVerify>) -> Result<Self, KeysetError> {
        wrapper::ensure_primary_enabled(&set)?;
        tracing::debug!(
            keys = set.len(),
            primary_key_id = set.primary().key_id,
            "wrapped verifier"
        );
        Ok(Self { set })
    }
}

impl PublicKeyVerify for WrappedVerify {
    fn verify(&self, signature: &[u8], data: &[u8]) -> Result<(), KeysetError> {
        // No valid signature is this short, with or without a prefix
        if signature.len() <= NON_RAW_PREFIX_SIZE {
            return Err(KeysetError::OperationFailed { operation: "verify signature" });
        }

        for (entry, payload) in self.set.candidates(signature) {
            let signed = authenticated_data(entry.output_prefix_type, data);
            if entry.primitive.verify(payload, &signed).is_ok() {
                return Ok(());
            }
        }

        tracing::debug!(len = signature.len(), "no key verified signature");
        Err(KeysetError::OperationFailed { operation: "verify signature" })
    }
}
