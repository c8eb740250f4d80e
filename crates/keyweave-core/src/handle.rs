//! Keyset handle.
//!
//! A [`KeysetHandle`] owns a validated keyset and resolves it into primitives.
//! Callers see key metadata through [`KeysetHandle::keyset_info`]; key
//! material stays inside the handle unless explicitly requested with
//! [`InsecureSecretKeyAccess`].

use std::fmt;

use crate::{
    env::{Environment, SystemEnv},
    error::KeysetError,
    key_manager::KeyManager,
    keyset::{
        InsecureSecretKeyAccess, Key, KeyData, KeyId, KeyStatus, KeyTemplate, Keyset, KeysetInfo,
        OutputPrefixType,
    },
    manager::KeysetManager,
    primitive_set::PrimitiveSet,
    registry::Registry,
    wrapper::PrimitiveWrapper,
};

/// Immutable handle to a keyset.
#[derive(Clone)]
pub struct KeysetHandle {
    keyset: Keyset,
}

impl KeysetHandle {
    /// Wrap a keyset after validating it.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyset`: see [`Keyset::validate`]
    pub fn new(keyset: Keyset) -> Result<Self, KeysetError> {
        keyset.validate()?;
        Ok(Self { keyset })
    }

    /// Single-key handle with placeholder metadata (id 0, `Unknown` status and
    /// prefix type), as produced by one derivation step. Only consumed by the
    /// keyset deriver wrapper, which assigns the real metadata.
    pub(crate) fn derived_placeholder(key_data: KeyData) -> Self {
        Self {
            keyset: Keyset {
                primary_key_id: 0,
                keys: vec![Key {
                    key_data,
                    key_id: 0,
                    status: KeyStatus::Unknown,
                    output_prefix_type: OutputPrefixType::Unknown,
                }],
            },
        }
    }

    /// Generate a single-key handle from `template` using the global registry.
    pub fn generate_new(template: &KeyTemplate) -> Result<Self, KeysetError> {
        Self::generate_new_with(template, Registry::global(), SystemEnv)
    }

    /// Generate a single-key handle using `registry` and `env`.
    pub fn generate_new_with<E: Environment>(
        template: &KeyTemplate,
        registry: &Registry,
        env: E,
    ) -> Result<Self, KeysetError> {
        let mut manager = KeysetManager::with_registry(registry.clone(), env);
        manager.add(template, true)?;
        manager.handle()
    }

    /// Metadata of every key.
    pub fn keyset_info(&self) -> KeysetInfo {
        self.keyset.info()
    }

    /// Id of the primary key.
    pub fn primary_key_id(&self) -> KeyId {
        self.keyset.primary_key_id
    }

    /// Primitive set resolved through the global registry.
    pub fn primitives(&self) -> Result<PrimitiveSet, KeysetError> {
        self.primitives_with(Registry::global())
    }

    /// Primitive set resolved through `registry`.
    pub fn primitives_with(&self, registry: &Registry) -> Result<PrimitiveSet, KeysetError> {
        registry.primitives_with_key_manager(&self.keyset, None)
    }

    /// Primitive set with every key constructed by `key_manager`.
    pub fn primitives_with_key_manager(
        &self,
        key_manager: &dyn KeyManager,
    ) -> Result<PrimitiveSet, KeysetError> {
        PrimitiveSet::new(&self.keyset, Registry::global(), Some(key_manager))
    }

    /// Wrapped primitive resolved through the global registry.
    ///
    /// ```ignore
    /// let aead = handle.primitive::<WrappedAead>()?;
    /// ```
    pub fn primitive<W: PrimitiveWrapper>(&self) -> Result<W, KeysetError> {
        self.primitive_with(Registry::global())
    }

    /// Wrapped primitive resolved through `registry`.
    pub fn primitive_with<W: PrimitiveWrapper>(
        &self,
        registry: &Registry,
    ) -> Result<W, KeysetError> {
        W::wrap(self.primitives_with(registry)?.into_capability::<W::Input>()?)
    }

    /// Wrapped primitive with every key constructed by `key_manager`.
    pub fn primitive_with_key_manager<W: PrimitiveWrapper>(
        &self,
        key_manager: &dyn KeyManager,
    ) -> Result<W, KeysetError> {
        W::wrap(self.primitives_with_key_manager(key_manager)?.into_capability::<W::Input>()?)
    }

    /// Public counterpart of a private keyset, resolved through the global
    /// registry.
    pub fn public_keyset_handle(&self) -> Result<Self, KeysetError> {
        self.public_keyset_handle_with(Registry::global())
    }

    /// Public counterpart of a private keyset, resolved through `registry`.
    ///
    /// Key ids, statuses and prefix types carry over; destroyed keys have no
    /// material left and are dropped.
    ///
    /// # Errors
    ///
    /// - `UnknownKeyType`: a key type is not registered
    /// - `NotPrivateKey`: a key type has no public counterpart
    /// - `InvalidKeyMaterial`: a private key is malformed
    pub fn public_keyset_handle_with(&self, registry: &Registry) -> Result<Self, KeysetError> {
        let keys = self
            .keyset
            .keys
            .iter()
            .filter(|key| key.status != KeyStatus::Destroyed)
            .map(|key| {
                Ok(Key {
                    key_data: registry.public_key_data(&key.key_data)?,
                    key_id: key.key_id,
                    status: key.status,
                    output_prefix_type: key.output_prefix_type,
                })
            })
            .collect::<Result<Vec<_>, KeysetError>>()?;

        Self::new(Keyset { primary_key_id: self.keyset.primary_key_id, keys })
    }

    /// The keyset including key material.
    pub fn insecure_keyset(&self, _access: InsecureSecretKeyAccess) -> &Keyset {
        &self.keyset
    }

    pub(crate) fn keyset(&self) -> &Keyset {
        &self.keyset
    }

    pub(crate) fn into_keyset(self) -> Keyset {
        self.keyset
    }
}

impl fmt::Debug for KeysetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeysetHandle").field("info", &self.keyset_info()).finish()
    }
}
