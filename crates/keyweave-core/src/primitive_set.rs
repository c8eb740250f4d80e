//! Primitive set: a keyset joined with one constructed primitive per key.
//!
//! Only `Enabled` keys become entries. Entries keep keyset order, and a
//! prefix index maps each identification prefix to every entry that shares
//! it (key ids are not globally unique, so collisions are legal).
//!
//! # Routing
//!
//! ```text
//! input = [p0 p1 p2 p3 p4 | payload ...]
//!
//! 1. for each non-empty prefix length L (longest first), if input > L bytes:
//!      entries with prefix input[..L], given input[L..]
//! 2. every Raw entry, given the whole input
//! ```
//!
//! # Invariants
//!
//! - Exactly one primary entry, and it is part of the prefix index
//! - Construction is all-or-nothing: one bad key fails the whole set
//! - Immutable after construction; shared read-only without locking

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    crypto_format,
    error::KeysetError,
    key_manager::KeyManager,
    keyset::{KeyId, KeyStatus, Keyset, OutputPrefixType},
    primitive::{Capability, Primitive},
    registry::Registry,
};

/// One key's primitive plus its metadata.
pub struct Entry<P: ?Sized> {
    /// Constructed primitive
    pub primitive: Arc<P>,
    /// Key id
    pub key_id: KeyId,
    /// Key status (always `Enabled` for entries built from a keyset)
    pub status: KeyStatus,
    /// Prefix discipline
    pub output_prefix_type: OutputPrefixType,
    /// Identification prefix (empty for `Raw`)
    pub prefix: Vec<u8>,
    /// Type URL of the key
    pub type_url: String,
}

impl<P: ?Sized> Clone for Entry<P> {
    fn clone(&self) -> Self {
        Self {
            primitive: Arc::clone(&self.primitive),
            key_id: self.key_id,
            status: self.status,
            output_prefix_type: self.output_prefix_type,
            prefix: self.prefix.clone(),
            type_url: self.type_url.clone(),
        }
    }
}

impl<P: ?Sized> fmt::Debug for Entry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key_id", &self.key_id)
            .field("status", &self.status)
            .field("output_prefix_type", &self.output_prefix_type)
            .field("type_url", &self.type_url)
            .finish_non_exhaustive()
    }
}

/// Immutable set of primitives for one keyset.
///
/// `P` starts as `dyn Primitive` and is narrowed to a capability with
/// [`into_capability`](PrimitiveSet::into_capability).
pub struct PrimitiveSet<P: ?Sized = dyn Primitive> {
    entries: Vec<Entry<P>>,
    by_prefix: HashMap<Vec<u8>, Vec<usize>>,
    /// Distinct non-empty prefix lengths, longest first
    prefix_lengths: Vec<usize>,
    primary: usize,
}

impl PrimitiveSet {
    /// Build the set for `keyset`.
    ///
    /// Each enabled key is resolved through `registry`, or through
    /// `key_manager` for every key when one is given.
    ///
    /// # Errors
    ///
    /// - `KeyConstruction`: a key's manager is missing, does not support the
    ///   key type or rejects its material, or no enabled key carries the
    ///   primary id
    /// - `UnknownPrefixType`: an enabled key has an `Unknown` prefix type
    /// - `UnsupportedDerivationType` / `DerivationFailed`: passed through
    ///   unchanged from a deriver key's manager
    pub fn new(
        keyset: &Keyset,
        registry: &Registry,
        key_manager: Option<&dyn KeyManager>,
    ) -> Result<Self, KeysetError> {
        let mut entries = Vec::with_capacity(keyset.keys.len());
        let mut primary = None;

        for key in keyset.keys.iter().filter(|key| key.status == KeyStatus::Enabled) {
            let type_url = key.key_data.type_url();
            let constructed = match key_manager {
                Some(manager) if !manager.does_support(type_url) => {
                    Err(KeysetError::InvalidKeyMaterial {
                        reason: format!(
                            "key manager for {} does not support {type_url}",
                            manager.type_url()
                        ),
                    })
                },
                Some(manager) => manager.primitive(key.key_data.material()),
                None => registry.primitive(&key.key_data),
            };
            let primitive = constructed.map_err(|err| match err {
                KeysetError::UnsupportedDerivationType { .. }
                | KeysetError::DerivationFailed { .. } => err,
                err => KeysetError::KeyConstruction { key_id: key.key_id, reason: err.to_string() },
            })?;

            if key.key_id == keyset.primary_key_id {
                if primary.is_some() {
                    return Err(KeysetError::KeyConstruction {
                        key_id: key.key_id,
                        reason: "primary key id is not unique".to_string(),
                    });
                }
                primary = Some(entries.len());
            }

            entries.push(Entry {
                primitive,
                key_id: key.key_id,
                status: key.status,
                output_prefix_type: key.output_prefix_type,
                prefix: crypto_format::output_prefix(key.key_id, key.output_prefix_type)?,
                type_url: type_url.to_string(),
            });
        }

        let Some(primary) = primary else {
            return Err(KeysetError::KeyConstruction {
                key_id: keyset.primary_key_id,
                reason: "primary key not found among enabled keys".to_string(),
            });
        };

        let set = Self::from_entries(entries, primary);
        tracing::debug!(
            keys = set.entries.len(),
            primary_key_id = keyset.primary_key_id,
            "built primitive set"
        );
        Ok(set)
    }

    /// Narrow every entry to capability `C`.
    ///
    /// # Errors
    ///
    /// - `Validation`: some entry's primitive does not provide `C`; entries
    ///   are never dropped silently
    pub fn into_capability<C: Capability + ?Sized>(self) -> Result<PrimitiveSet<C>, KeysetError> {
        let entries = self
            .entries
            .into_iter()
            .map(|entry| {
                let Some(primitive) = C::from_primitive(entry.primitive) else {
                    return Err(KeysetError::Validation {
                        capability: C::NAME,
                        reason: format!(
                            "key {} of type {} does not provide this capability",
                            entry.key_id, entry.type_url
                        ),
                    });
                };
                Ok(Entry {
                    primitive,
                    key_id: entry.key_id,
                    status: entry.status,
                    output_prefix_type: entry.output_prefix_type,
                    prefix: entry.prefix,
                    type_url: entry.type_url,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PrimitiveSet {
            entries,
            by_prefix: self.by_prefix,
            prefix_lengths: self.prefix_lengths,
            primary: self.primary,
        })
    }
}

impl<P: ?Sized> PrimitiveSet<P> {
    fn from_entries(entries: Vec<Entry<P>>, primary: usize) -> Self {
        let mut by_prefix: HashMap<Vec<u8>, Vec<usize>> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            by_prefix.entry(entry.prefix.clone()).or_default().push(index);
        }

        let mut prefix_lengths: Vec<usize> =
            by_prefix.keys().map(Vec::len).filter(|&len| len > 0).collect();
        prefix_lengths.sort_unstable_by(|a, b| b.cmp(a));
        prefix_lengths.dedup();

        Self { entries, by_prefix, prefix_lengths, primary }
    }

    /// The primary entry.
    pub fn primary(&self) -> &Entry<P> {
        &self.entries[self.primary]
    }

    /// All entries in keyset order.
    pub fn entries(&self) -> &[Entry<P>] {
        &self.entries
    }

    /// Entries sharing `prefix`, in keyset order.
    pub fn entries_for_prefix(&self, prefix: &[u8]) -> impl Iterator<Item = &Entry<P>> {
        self.by_prefix
            .get(prefix)
            .into_iter()
            .flatten()
            .map(|&index| &self.entries[index])
    }

    /// Entries with the `Raw` discipline, in keyset order.
    pub fn raw_entries(&self) -> impl Iterator<Item = &Entry<P>> {
        self.entries_for_prefix(&[])
    }

    /// Candidate entries for `input` with the bytes each should process.
    ///
    /// Prefix matches come first (longest prefix length first), followed by
    /// every `Raw` entry with the full input. An input no longer than a prefix
    /// length is only offered to `Raw` entries.
    pub fn candidates<'a>(&'a self, input: &'a [u8]) -> Vec<(&'a Entry<P>, &'a [u8])> {
        let mut candidates = Vec::new();

        for &len in &self.prefix_lengths {
            if input.len() > len {
                let (prefix, payload) = input.split_at(len);
                candidates.extend(self.entries_for_prefix(prefix).map(|entry| (entry, payload)));
            }
        }
        candidates.extend(self.raw_entries().map(|entry| (entry, input)));

        candidates
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no entries. Never true for a constructed set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: ?Sized> Clone for PrimitiveSet<P> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            by_prefix: self.by_prefix.clone(),
            prefix_lengths: self.prefix_lengths.clone(),
            primary: self.primary,
        }
    }
}

impl<P: ?Sized> fmt::Debug for PrimitiveSet<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveSet")
            .field("entries", &self.entries)
            .field("primary_key_id", &self.primary().key_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        keyset::{Key, KeyData},
        primitive::{Aead, Mac},
    };

    const TYPE_URL: &str = "type.test/Tagged";

    /// Primitive whose key material is a single tag byte.
    struct Tagged(u8);

    impl Mac for Tagged {
        fn compute_mac(&self, _data: &[u8]) -> Result<Vec<u8>, KeysetError> {
            Ok(vec![self.0; 10])
        }

        fn verify_mac(&self, tag: &[u8], _data: &[u8]) -> Result<(), KeysetError> {
            if tag == [self.0; 10] {
                Ok(())
            } else {
                Err(KeysetError::OperationFailed { operation: "verify" })
            }
        }
    }

    impl Primitive for Tagged {
        fn into_mac(self: Arc<Self>) -> Option<Arc<dyn Mac>> {
            Some(self)
        }
    }

    struct TaggedManager;

    impl KeyManager for TaggedManager {
        fn type_url(&self) -> &str {
            TYPE_URL
        }

        fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
            match serialized_key {
                [tag] => Ok(Arc::new(Tagged(*tag))),
                _ => Err(KeysetError::InvalidKeyMaterial {
                    reason: "expected 1 byte".to_string(),
                }),
            }
        }

        fn new_key_data(&self, _serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
            Ok(KeyData::new(TYPE_URL, vec![0]))
        }
    }

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.register_key_manager(TaggedManager, true).unwrap();
        registry
    }

    fn key(key_id: KeyId, status: KeyStatus, output_prefix_type: OutputPrefixType) -> Key {
        Key {
            key_data: KeyData::new(TYPE_URL, vec![key_id as u8]),
            key_id,
            status,
            output_prefix_type,
        }
    }

    fn build(keyset: &Keyset) -> Result<PrimitiveSet, KeysetError> {
        PrimitiveSet::new(keyset, &registry(), None)
    }

    fn ids<'a, P: ?Sized + 'a>(entries: impl Iterator<Item = &'a Entry<P>>) -> Vec<KeyId> {
        entries.map(|entry| entry.key_id).collect()
    }

    #[test]
    fn only_enabled_keys_become_entries() {
        let keyset = Keyset {
            primary_key_id: 1,
            keys: vec![
                key(1, KeyStatus::Enabled, OutputPrefixType::Tink),
                key(2, KeyStatus::Disabled, OutputPrefixType::Tink),
                key(3, KeyStatus::Destroyed, OutputPrefixType::Tink),
                key(4, KeyStatus::Enabled, OutputPrefixType::Raw),
            ],
        };
        let set = build(&keyset).unwrap();

        assert_eq!(ids(set.entries().iter()), vec![1, 4]);
        assert_eq!(set.primary().key_id, 1);
    }

    #[test]
    fn entries_record_prefixes() {
        let keyset = Keyset {
            primary_key_id: 2,
            keys: vec![
                key(1, KeyStatus::Enabled, OutputPrefixType::Raw),
                key(2, KeyStatus::Enabled, OutputPrefixType::Tink),
                key(3, KeyStatus::Enabled, OutputPrefixType::Legacy),
            ],
        };
        let set = build(&keyset).unwrap();

        assert!(set.entries()[0].prefix.is_empty());
        assert_eq!(set.entries()[1].prefix, vec![0x01, 0, 0, 0, 2]);
        assert_eq!(set.entries()[2].prefix, vec![0x00, 0, 0, 0, 3]);
        assert_eq!(ids(set.raw_entries()), vec![1]);
    }

    #[test]
    fn colliding_prefixes_keep_keyset_order() {
        let keyset = Keyset {
            primary_key_id: 5,
            keys: vec![
                key(5, KeyStatus::Enabled, OutputPrefixType::Legacy),
                key(5, KeyStatus::Disabled, OutputPrefixType::Tink),
                key(9, KeyStatus::Enabled, OutputPrefixType::Tink),
                key(5, KeyStatus::Enabled, OutputPrefixType::Crunchy),
            ],
        };
        // Two enabled keys with id 5 make the primary ambiguous
        assert!(matches!(build(&keyset), Err(KeysetError::KeyConstruction { key_id: 5, .. })));

        let keyset = Keyset {
            primary_key_id: 9,
            keys: vec![
                key(5, KeyStatus::Enabled, OutputPrefixType::Legacy),
                key(9, KeyStatus::Enabled, OutputPrefixType::Tink),
                key(5, KeyStatus::Enabled, OutputPrefixType::Crunchy),
            ],
        };
        let set = build(&keyset).unwrap();
        let matches: Vec<_> = set
            .entries_for_prefix(&[0x00, 0, 0, 0, 5])
            .map(|entry| entry.output_prefix_type)
            .collect();

        assert_eq!(matches, vec![OutputPrefixType::Legacy, OutputPrefixType::Crunchy]);
    }

    #[test]
    fn candidates_try_prefix_matches_then_raw() {
        let keyset = Keyset {
            primary_key_id: 2,
            keys: vec![
                key(1, KeyStatus::Enabled, OutputPrefixType::Raw),
                key(2, KeyStatus::Enabled, OutputPrefixType::Tink),
                key(3, KeyStatus::Enabled, OutputPrefixType::Tink),
            ],
        };
        let set = build(&keyset).unwrap();

        let input = [0x01, 0, 0, 0, 2, 0xAA, 0xBB];
        let candidates = set.candidates(&input);
        let routed: Vec<_> =
            candidates.iter().map(|(entry, bytes)| (entry.key_id, *bytes)).collect();

        assert_eq!(routed, vec![(2, &input[5..]), (1, &input[..])]);
    }

    #[test]
    fn unprefixed_input_reaches_only_raw_entries() {
        let keyset = Keyset {
            primary_key_id: 2,
            keys: vec![
                key(1, KeyStatus::Enabled, OutputPrefixType::Raw),
                key(2, KeyStatus::Enabled, OutputPrefixType::Tink),
            ],
        };
        let set = build(&keyset).unwrap();

        let routed = |input: &[u8]| -> Vec<KeyId> {
            set.candidates(input).into_iter().map(|(entry, _)| entry.key_id).collect()
        };

        assert_eq!(routed(&[0x42; 32]), vec![1]);
        // Input exactly as long as a prefix carries no payload
        assert_eq!(routed(&[0x01, 0, 0, 0, 2]), vec![1]);
    }

    #[test]
    fn one_bad_key_fails_the_whole_set() {
        let mut bad = key(3, KeyStatus::Enabled, OutputPrefixType::Tink);
        bad.key_data = KeyData::new(TYPE_URL, vec![1, 2, 3]);
        let keyset = Keyset {
            primary_key_id: 1,
            keys: vec![key(1, KeyStatus::Enabled, OutputPrefixType::Tink), bad],
        };

        assert!(matches!(build(&keyset), Err(KeysetError::KeyConstruction { key_id: 3, .. })));
    }

    #[test]
    fn unknown_type_url_fails_construction() {
        let mut unknown = key(1, KeyStatus::Enabled, OutputPrefixType::Tink);
        unknown.key_data = KeyData::new("type.test/Missing", vec![1]);
        let keyset = Keyset { primary_key_id: 1, keys: vec![unknown] };

        assert!(matches!(build(&keyset), Err(KeysetError::KeyConstruction { key_id: 1, .. })));
    }

    #[test]
    fn missing_primary_fails_construction() {
        let keyset = Keyset {
            primary_key_id: 2,
            keys: vec![
                key(1, KeyStatus::Enabled, OutputPrefixType::Tink),
                key(2, KeyStatus::Disabled, OutputPrefixType::Tink),
            ],
        };

        assert!(matches!(build(&keyset), Err(KeysetError::KeyConstruction { key_id: 2, .. })));
    }

    #[test]
    fn override_manager_must_support_key_type() {
        struct Unrelated;

        impl KeyManager for Unrelated {
            fn type_url(&self) -> &str {
                "type.test/Unrelated"
            }

            fn primitive(&self, _key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
                Ok(Arc::new(Tagged(0)))
            }

            fn new_key_data(&self, _params: &[u8]) -> Result<KeyData, KeysetError> {
                Ok(KeyData::new("type.test/Unrelated", Vec::new()))
            }
        }

        let keyset = Keyset {
            primary_key_id: 1,
            keys: vec![key(1, KeyStatus::Enabled, OutputPrefixType::Raw)],
        };

        let result = PrimitiveSet::new(&keyset, &Registry::new(), Some(&Unrelated));
        assert!(matches!(result, Err(KeysetError::KeyConstruction { key_id: 1, .. })));

        let set = PrimitiveSet::new(&keyset, &Registry::new(), Some(&TaggedManager)).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn derivation_errors_keep_their_kind() {
        struct NotDerivable;

        impl KeyManager for NotDerivable {
            fn type_url(&self) -> &str {
                TYPE_URL
            }

            fn primitive(&self, _key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
                Err(KeysetError::UnsupportedDerivationType { type_url: "type.test/Target".into() })
            }

            fn new_key_data(&self, _params: &[u8]) -> Result<KeyData, KeysetError> {
                Ok(KeyData::new(TYPE_URL, vec![0]))
            }
        }

        let keyset = Keyset {
            primary_key_id: 1,
            keys: vec![key(1, KeyStatus::Enabled, OutputPrefixType::Tink)],
        };

        let err = PrimitiveSet::new(&keyset, &Registry::new(), Some(&NotDerivable)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedDerivationType);
    }

    #[test]
    fn into_capability_keeps_routing() {
        let keyset = Keyset {
            primary_key_id: 2,
            keys: vec![
                key(1, KeyStatus::Enabled, OutputPrefixType::Raw),
                key(2, KeyStatus::Enabled, OutputPrefixType::Tink),
            ],
        };
        let set = build(&keyset).unwrap().into_capability::<dyn Mac>().unwrap();

        assert_eq!(set.primary().key_id, 2);
        assert_eq!(set.primary().primitive.compute_mac(b"").unwrap(), vec![2; 10]);
        assert_eq!(ids(set.raw_entries()), vec![1]);
    }

    #[test]
    fn into_capability_rejects_missing_capability() {
        let keyset = Keyset {
            primary_key_id: 1,
            keys: vec![key(1, KeyStatus::Enabled, OutputPrefixType::Raw)],
        };

        let result = build(&keyset).unwrap().into_capability::<dyn Aead>();
        assert!(matches!(result, Err(KeysetError::Validation { capability: "aead", .. })));
    }
}
