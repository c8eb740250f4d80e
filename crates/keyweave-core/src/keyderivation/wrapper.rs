//! Keyset deriver wrapper.
//!
//! Derives once per entry, in keyset order, and reassembles one keyset whose
//! key ids, statuses and prefix types mirror the source entries. Only the key
//! material comes from derivation.

use crate::{
    error::KeysetError,
    handle::KeysetHandle,
    keyset::{Key, Keyset},
    primitive::KeysetDeriver,
    primitive_set::PrimitiveSet,
    wrapper::{self, PrimitiveWrapper},
};

/// Keyset deriver across every enabled key of a keyset.
#[derive(Debug, Clone)]
pub struct WrappedKeysetDeriver {
    set: PrimitiveSet<dyn KeysetDeriver>,
}

impl PrimitiveWrapper for WrappedKeysetDeriver {
    type Input = dyn KeysetDeriver;

    fn wrap(set: PrimitiveSet<dyn KeysetDeriver>) -> Result<Self, KeysetError> {
        wrapper::ensure_primary_enabled(&set)?;
        tracing::debug!(
            keys = set.len(),
            primary_key_id = set.primary().key_id,
            "wrapped keyset deriver"
        );
        Ok(Self { set })
    }
}

impl KeysetDeriver for WrappedKeysetDeriver {
    fn derive_keyset(&self, salt: &[u8]) -> Result<KeysetHandle, KeysetError> {
        let mut keys = Vec::with_capacity(self.set.len());

        for entry in self.set.entries() {
            let derived = entry.primitive.derive_keyset(salt)?.into_keyset();
            let key_count = derived.keys.len();
            let Some(key) = derived.keys.into_iter().next().filter(|_| key_count == 1) else {
                return Err(KeysetError::DerivationFailed {
                    reason: format!(
                        "key {} derived a keyset with {key_count} keys, expected 1",
                        entry.key_id
                    ),
                });
            };

            tracing::trace!(key_id = entry.key_id, "derived key");
            keys.push(Key {
                key_data: key.key_data,
                key_id: entry.key_id,
                status: entry.status,
                output_prefix_type: entry.output_prefix_type,
            });
        }

        tracing::debug!(keys = keys.len(), "derived keyset");
        KeysetHandle::new(Keyset { primary_key_id: self.set.primary().key_id, keys })
    }
}
