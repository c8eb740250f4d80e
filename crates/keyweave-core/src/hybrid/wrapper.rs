//! Hybrid encryption wrappers over primitive sets.

use crate::{
    error::KeysetError,
    primitive::{HybridDecrypt, HybridEncrypt},
    primitive_set::PrimitiveSet,
    wrapper::{self, PrimitiveWrapper},
};

/// Encrypts to the primary key of a public keyset.
///
/// Ciphertext layout: `prefix(primary) ‖ ciphertext(primary)`.
#[derive(Debug, Clone)]
pub struct WrappedHybridEncrypt {
    set: PrimitiveSet<dyn HybridEncrypt>,
}

impl PrimitiveWrapper for WrappedHybridEncrypt {
    type Input = dyn HybridEncrypt;

    fn wrap(set: PrimitiveSet<dyn HybridEncrypt>) -> Result<Self, KeysetError> {
        wrapper::ensure_primary_enabled(&set)?;
        tracing::debug!(
            keys = set.len(),
            primary_key_id = set.primary().key_id,
            "wrapped hybrid encrypt"
        );
        Ok(Self { set })
    }
}

impl HybridEncrypt for WrappedHybridEncrypt {
    fn encrypt(&self, plaintext: &[u8], context_info: &[u8]) -> Result<Vec<u8>, KeysetError> {
        let primary = self.set.primary();
        let ciphertext = primary.primitive.encrypt(plaintext, context_info)?;

        let mut output = Vec::with_capacity(primary.prefix.len() + ciphertext.len());
        output.extend_from_slice(&primary.prefix);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }
}

/// Decrypts with any enabled key of a private keyset.
#[derive(Debug, Clone)]
pub struct WrappedHybridDecrypt {
    set: PrimitiveSet<dyn HybridDecrypt>,
}

impl PrimitiveWrapper for WrappedHybridDecrypt {
    type Input = dyn HybridDecrypt;

    fn wrap(set: PrimitiveSet<dyn HybridDecrypt>) -> Result<Self, KeysetError> {
        wrapper::ensure_primary_enabled(&set)?;
        tracing::debug!(
            keys = set.len(),
            primary_key_id = set.primary().key_id,
            "wrapped hybrid decrypt"
        );
        Ok(Self { set })
    }
}

impl HybridDecrypt for WrappedHybridDecrypt {
    fn decrypt(&self, ciphertext: &[u8], context_info: &[u8]) -> Result<Vec<u8>, KeysetError> {
        for (entry, payload) in self.set.candidates(ciphertext) {
            if let Ok(plaintext) = entry.primitive.decrypt(payload, context_info) {
                return Ok(plaintext);
            }
        }

        tracing::debug!(len = ciphertext.len(), "no key decrypted hybrid ciphertext");
        Err(KeysetError::OperationFailed { operation: "hybrid decrypt" })
    }
}
