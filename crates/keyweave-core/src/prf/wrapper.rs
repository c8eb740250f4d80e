//! PRF wrappers over a primitive set.
//!
//! # Invariants
//!
//! - Every entry uses the `Raw` prefix type: PRF output is never prefixed.
//! - Key ids are unique within the set.
//! - [`WrappedStreamingPrf`] wraps exactly one key.

use std::{collections::BTreeMap, io::Read, sync::Arc};

use crate::{
    error::KeysetError,
    keyset::KeyId,
    primitive::{Capability, Prf, StreamingPrf},
    primitive_set::PrimitiveSet,
    wrapper::{self, PrimitiveWrapper},
};

/// Every PRF of a keyset, addressable by key id.
#[derive(Clone)]
pub struct PrfSet {
    primary_id: KeyId,
    prfs: BTreeMap<KeyId, Arc<dyn Prf>>,
}

impl PrfSet {
    /// Id of the primary key.
    pub fn primary_id(&self) -> KeyId {
        self.primary_id
    }

    /// Output of the primary PRF.
    pub fn compute_primary(&self, input: &[u8], output_len: usize) -> Result<Vec<u8>, KeysetError> {
        self.prfs
            .get(&self.primary_id)
            .ok_or(KeysetError::KeyNotFound { key_id: self.primary_id })?
            .compute(input, output_len)
    }

    /// PRF of `key_id`, if the key is in the set.
    pub fn prf(&self, key_id: KeyId) -> Option<&Arc<dyn Prf>> {
        self.prfs.get(&key_id)
    }

    /// Every PRF, ordered by key id.
    pub fn prfs(&self) -> &BTreeMap<KeyId, Arc<dyn Prf>> {
        &self.prfs
    }
}

impl std::fmt::Debug for PrfSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrfSet")
            .field("primary_id", &self.primary_id)
            .field("key_ids", &self.prfs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PrimitiveWrapper for PrfSet {
    type Input = dyn Prf;

    fn wrap(set: PrimitiveSet<dyn Prf>) -> Result<Self, KeysetError> {
        wrapper::ensure_primary_enabled(&set)?;
        wrapper::ensure_all_raw(&set)?;

        let mut prfs = BTreeMap::new();
        for entry in set.entries() {
            if prfs.insert(entry.key_id, Arc::clone(&entry.primitive)).is_some() {
                return Err(KeysetError::Validation {
                    capability: <dyn Prf as Capability>::NAME,
                    reason: format!("duplicate key id {}", entry.key_id),
                });
            }
        }

        Ok(Self { primary_id: set.primary().key_id, prfs })
    }
}

/// Streaming PRF over a single-key keyset.
#[derive(Clone)]
pub struct WrappedStreamingPrf {
    prf: Arc<dyn StreamingPrf>,
}

impl std::fmt::Debug for WrappedStreamingPrf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedStreamingPrf").finish_non_exhaustive()
    }
}

impl PrimitiveWrapper for WrappedStreamingPrf {
    type Input = dyn StreamingPrf;

    fn wrap(set: PrimitiveSet<dyn StreamingPrf>) -> Result<Self, KeysetError> {
        if set.len() != 1 {
            return Err(KeysetError::Validation {
                capability: <dyn StreamingPrf as Capability>::NAME,
                reason: format!("expected exactly one key, found {}", set.len()),
            });
        }
        wrapper::ensure_primary_enabled(&set)?;
        wrapper::ensure_all_raw(&set)?;

        Ok(Self { prf: Arc::clone(&set.primary().primitive) })
    }
}

impl StreamingPrf for WrappedStreamingPrf {
    fn compute_stream(&self, input: &[u8]) -> Result<Box<dyn Read + Send>, KeysetError> {
        self.prf.compute_stream(input)
    }
}
