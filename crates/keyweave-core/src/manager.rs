//! Keyset manager: key rotation on a mutable keyset.
//!
//! Rotation follows the usual sequence: add a new key as a secondary, roll
//! it out, promote it with `set_primary`, then disable, destroy or delete the
//! old key. The primary key can never be disabled, destroyed or deleted.

use crate::{
    env::{Environment, SystemEnv},
    error::KeysetError,
    handle::KeysetHandle,
    keyset::{Key, KeyData, KeyId, KeyStatus, KeyTemplate, Keyset, OutputPrefixType},
    registry::Registry,
};

/// Mutable builder for keysets.
pub struct KeysetManager<E: Environment = SystemEnv> {
    keyset: Keyset,
    registry: Registry,
    env: E,
}

impl KeysetManager {
    /// Empty manager using the global registry.
    pub fn new() -> Self {
        Self::with_registry(Registry::global().clone(), SystemEnv)
    }

    /// Manager seeded with the keys of `handle`, using the global registry.
    pub fn from_handle(handle: &KeysetHandle) -> Self {
        Self::from_handle_with(handle, Registry::global().clone(), SystemEnv)
    }
}

impl Default for KeysetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Environment> KeysetManager<E> {
    /// Empty manager using `registry` for key generation and `env` for key ids.
    pub fn with_registry(registry: Registry, env: E) -> Self {
        Self { keyset: Keyset { primary_key_id: 0, keys: Vec::new() }, registry, env }
    }

    /// Manager seeded with the keys of `handle`.
    pub fn from_handle_with(handle: &KeysetHandle, registry: Registry, env: E) -> Self {
        Self { keyset: handle.keyset().clone(), registry, env }
    }

    /// Generate a key from `template` and append it as `Enabled`.
    ///
    /// Returns the new key id, drawn at random and unique within the keyset.
    ///
    /// # Errors
    ///
    /// - `InvalidTemplate`: the template has an `Unknown` prefix type
    /// - `UnknownKeyType` / `NewKeyNotAllowed`: registry refused generation
    pub fn add(&mut self, template: &KeyTemplate, as_primary: bool) -> Result<KeyId, KeysetError> {
        if template.output_prefix_type == OutputPrefixType::Unknown {
            return Err(KeysetError::InvalidTemplate {
                reason: "unknown output prefix type".to_string(),
            });
        }

        let key_data = self.registry.new_key_data(template)?;
        let key_id = self.new_key_id();
        self.keyset.keys.push(Key {
            key_data,
            key_id,
            status: KeyStatus::Enabled,
            output_prefix_type: template.output_prefix_type,
        });
        if as_primary {
            self.keyset.primary_key_id = key_id;
        }

        tracing::debug!(key_id, as_primary, type_url = %template.type_url, "added key");
        Ok(key_id)
    }

    /// Make `key_id` the primary key. The key must be `Enabled`.
    pub fn set_primary(&mut self, key_id: KeyId) -> Result<(), KeysetError> {
        let key = self.key_mut(key_id)?;
        if key.status != KeyStatus::Enabled {
            return Err(KeysetError::InvalidKeyset {
                reason: format!("cannot make key {key_id} primary: it is not enabled"),
            });
        }

        self.keyset.primary_key_id = key_id;
        Ok(())
    }

    /// Enable a disabled key.
    pub fn enable(&mut self, key_id: KeyId) -> Result<(), KeysetError> {
        let key = self.key_mut(key_id)?;
        match key.status {
            KeyStatus::Enabled | KeyStatus::Disabled => {
                key.status = KeyStatus::Enabled;
                Ok(())
            },
            status => Err(KeysetError::InvalidKeyset {
                reason: format!("cannot enable key {key_id} with status {status:?}"),
            }),
        }
    }

    /// Disable a non-primary key.
    pub fn disable(&mut self, key_id: KeyId) -> Result<(), KeysetError> {
        self.ensure_not_primary(key_id, "disable")?;
        let key = self.key_mut(key_id)?;
        match key.status {
            KeyStatus::Enabled | KeyStatus::Disabled => {
                key.status = KeyStatus::Disabled;
                Ok(())
            },
            status => Err(KeysetError::InvalidKeyset {
                reason: format!("cannot disable key {key_id} with status {status:?}"),
            }),
        }
    }

    /// Destroy a non-primary key, erasing its material but keeping its id.
    pub fn destroy(&mut self, key_id: KeyId) -> Result<(), KeysetError> {
        self.ensure_not_primary(key_id, "destroy")?;
        let key = self.key_mut(key_id)?;

        // Replacing the KeyData drops (and zeroizes) the old material
        key.key_data = KeyData::new(key.key_data.type_url(), Vec::new());
        key.status = KeyStatus::Destroyed;
        Ok(())
    }

    /// Remove a non-primary key from the keyset.
    pub fn delete(&mut self, key_id: KeyId) -> Result<(), KeysetError> {
        self.ensure_not_primary(key_id, "delete")?;
        let before = self.keyset.keys.len();
        self.keyset.keys.retain(|key| key.key_id != key_id);

        if self.keyset.keys.len() == before {
            return Err(KeysetError::KeyNotFound { key_id });
        }
        Ok(())
    }

    /// Number of keys, in any status.
    pub fn key_count(&self) -> usize {
        self.keyset.keys.len()
    }

    /// Handle over the current keyset.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyset`: no primary has been set, or the keyset is empty
    pub fn handle(&self) -> Result<KeysetHandle, KeysetError> {
        KeysetHandle::new(self.keyset.clone())
    }

    fn new_key_id(&self) -> KeyId {
        loop {
            let candidate = self.env.random_u32();
            if !self.keyset.keys.iter().any(|key| key.key_id == candidate) {
                return candidate;
            }
        }
    }

    fn key_mut(&mut self, key_id: KeyId) -> Result<&mut Key, KeysetError> {
        self.keyset
            .keys
            .iter_mut()
            .find(|key| key.key_id == key_id)
            .ok_or(KeysetError::KeyNotFound { key_id })
    }

    fn ensure_not_primary(
        &self,
        key_id: KeyId,
        operation: &'static str,
    ) -> Result<(), KeysetError> {
        if self.keyset.primary_key_id == key_id && !self.keyset.keys.is_empty() {
            return Err(KeysetError::PrimaryKeyOperation { operation, key_id });
        }
        Ok(())
    }
}
