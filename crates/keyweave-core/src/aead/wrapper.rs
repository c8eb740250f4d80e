//! AEAD wrapper over a primitive set.

use crate::{
    error::KeysetError,
    primitive::Aead,
    primitive_set::PrimitiveSet,
    wrapper::{self, PrimitiveWrapper},
};

/// AEAD across every enabled key of a keyset.
///
/// Ciphertext layout: `prefix(primary) ‖ ciphertext(primary)`.
#[derive(Debug, Clone)]
pub struct WrappedAead {
    set: PrimitiveSet<dyn Aead>,
}

impl PrimitiveWrapper for WrappedAead {
    type Input = dyn Aead;

    fn wrap(set: PrimitiveSet<dyn Aead>) -> Result<Self, KeysetError> {
        wrapper::ensure_primary_enabled(&set)?;
        tracing::debug!(keys = set.len(), primary_key_id = set.primary().key_id, "wrapped aead");
        Ok(Self { set })
    }
}

impl Aead for WrappedAead {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, KeysetError> {
        let primary = self.set.primary();
        let ciphertext = primary.primitive.encrypt(plaintext, associated_data)?;

        let mut output = Vec::with_capacity(primary.prefix.len() + ciphertext.len());
        output.extend_from_slice(&primary.prefix);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, KeysetError> {
        for (entry, payload) in self.set.candidates(ciphertext) {
            if let Ok(plaintext) = entry.primitive.decrypt(payload, associated_data) {
                return Ok(plaintext);
            }
        }

        tracing::debug!(len = ciphertext.len(), "no key decrypted ciphertext");
        Err(KeysetError::OperationFailed { operation: "decrypt" })
    }
}
