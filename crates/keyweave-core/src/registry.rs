//! Type URL to key manager registry.
//!
//! Registration happens at start-up and is rare; lookups happen on every
//! keyset resolution and may run concurrently on many threads. State sits
//! behind an `RwLock` and every method releases the lock before calling into
//! a key manager, so managers may call back into the registry.
//!
//! # Security
//!
//! At most one manager type serves a type URL. Registering the same concrete
//! manager type again is a no-op, but a different type for an already known
//! URL fails. Once new-key generation is disallowed for a type it stays
//! disallowed.

use std::{
    any::TypeId,
    collections::HashMap,
    io::Read,
    sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak},
};

use crate::{
    error::KeysetError,
    key_manager::{DerivableKeyManager, KeyManager, PrivateKeyManager},
    keyset::{KeyData, KeyTemplate, Keyset},
    primitive::Primitive,
    primitive_set::PrimitiveSet,
};

/// Shared registry handle. Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<RegistryInner>>,
}

/// Non-owning registry handle, for managers stored inside the registry they
/// refer to.
#[derive(Clone)]
pub struct WeakRegistry {
    inner: Weak<RwLock<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    managers: HashMap<String, Registration>,
}

#[derive(Clone)]
struct Registration {
    manager: Arc<dyn KeyManager>,
    derivable: Option<Arc<dyn DerivableKeyManager>>,
    private: Option<Arc<dyn PrivateKeyManager>>,
    concrete_type: TypeId,
    new_key_allowed: bool,
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    ///
    /// Empty until something is registered, see
    /// [`config::register_defaults`](crate::config::register_defaults).
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    /// Register `manager` for its type URL.
    ///
    /// # Errors
    ///
    /// - `ManagerConflict`: a different manager type owns the type URL
    /// - `NewKeyAllowedConflict`: new keys were disallowed earlier and
    ///   `new_key_allowed` is `true`
    pub fn register_key_manager<M: KeyManager>(
        &self,
        manager: M,
        new_key_allowed: bool,
    ) -> Result<(), KeysetError> {
        let manager = Arc::new(manager);
        self.register(Registration {
            manager,
            derivable: None,
            private: None,
            concrete_type: TypeId::of::<M>(),
            new_key_allowed,
        })
    }

    /// Register a manager that also supports key derivation.
    ///
    /// Same conflict rules as [`register_key_manager`](Self::register_key_manager).
    pub fn register_derivable_key_manager<M: DerivableKeyManager>(
        &self,
        manager: M,
        new_key_allowed: bool,
    ) -> Result<(), KeysetError> {
        let manager = Arc::new(manager);
        self.register(Registration {
            manager: Arc::clone(&manager) as Arc<dyn KeyManager>,
            derivable: Some(manager as Arc<dyn DerivableKeyManager>),
            private: None,
            concrete_type: TypeId::of::<M>(),
            new_key_allowed,
        })
    }

    /// Register a private key manager, whose keys can yield public keys.
    ///
    /// Same conflict rules as [`register_key_manager`](Self::register_key_manager).
    pub fn register_private_key_manager<M: PrivateKeyManager>(
        &self,
        manager: M,
        new_key_allowed: bool,
    ) -> Result<(), KeysetError> {
        let manager = Arc::new(manager);
        self.register(Registration {
            manager: Arc::clone(&manager) as Arc<dyn KeyManager>,
            derivable: None,
            private: Some(manager as Arc<dyn PrivateKeyManager>),
            concrete_type: TypeId::of::<M>(),
            new_key_allowed,
        })
    }

    fn register(&self, registration: Registration) -> Result<(), KeysetError> {
        let type_url = registration.manager.type_url().to_string();
        let mut inner = self.write();

        if let Some(existing) = inner.managers.get_mut(&type_url) {
            if existing.concrete_type != registration.concrete_type {
                tracing::warn!(%type_url, "rejected conflicting key manager registration");
                return Err(KeysetError::ManagerConflict { type_url });
            }
            if !existing.new_key_allowed && registration.new_key_allowed {
                return Err(KeysetError::NewKeyAllowedConflict { type_url });
            }

            existing.new_key_allowed = registration.new_key_allowed;
            if existing.derivable.is_none() {
                existing.derivable = registration.derivable;
            }
            if existing.private.is_none() {
                existing.private = registration.private;
            }
            return Ok(());
        }

        tracing::info!(
            %type_url,
            derivable = registration.derivable.is_some(),
            new_key_allowed = registration.new_key_allowed,
            "registered key manager"
        );
        inner.managers.insert(type_url, registration);
        Ok(())
    }

    /// Manager registered for `type_url`.
    ///
    /// # Errors
    ///
    /// - `UnknownKeyType`: nothing is registered for `type_url`
    pub fn key_manager(&self, type_url: &str) -> Result<Arc<dyn KeyManager>, KeysetError> {
        self.registration(type_url).map(|registration| registration.manager)
    }

    /// Whether a manager is registered for `type_url`.
    pub fn is_registered(&self, type_url: &str) -> bool {
        self.read().managers.contains_key(type_url)
    }

    /// Whether keys of `type_url` can be derived from a randomness stream.
    pub fn can_derive_keys(&self, type_url: &str) -> bool {
        self.read().managers.get(type_url).is_some_and(|r| r.derivable.is_some())
    }

    /// Derive key material for `template` from `randomness`.
    ///
    /// # Errors
    ///
    /// - `UnsupportedDerivationType`: the template type is unknown or not
    ///   derivable
    /// - `DerivationFailed`: the manager rejected the stream
    pub fn derive_key(
        &self,
        template: &KeyTemplate,
        randomness: &mut dyn Read,
    ) -> Result<KeyData, KeysetError> {
        let derivable =
            self.read().managers.get(&template.type_url).and_then(|r| r.derivable.clone());
        let Some(manager) = derivable else {
            return Err(KeysetError::UnsupportedDerivationType {
                type_url: template.type_url.clone(),
            });
        };

        manager.derive_key(&template.value, randomness)
    }

    /// Generate fresh key material for `template`.
    ///
    /// # Errors
    ///
    /// - `UnknownKeyType`: nothing is registered for the template type
    /// - `NewKeyNotAllowed`: new keys of this type are disallowed
    pub fn new_key_data(&self, template: &KeyTemplate) -> Result<KeyData, KeysetError> {
        let registration = self.registration(&template.type_url)?;
        if !registration.new_key_allowed {
            return Err(KeysetError::NewKeyNotAllowed { type_url: template.type_url.clone() });
        }

        registration.manager.new_key_data(&template.value)
    }

    /// Public key data for one private key.
    ///
    /// # Errors
    ///
    /// - `UnknownKeyType`: nothing is registered for the key type
    /// - `NotPrivateKey`: the key type has no public counterpart
    /// - `InvalidKeyMaterial`: the private key is malformed
    pub fn public_key_data(&self, private_key_data: &KeyData) -> Result<KeyData, KeysetError> {
        let type_url = private_key_data.type_url();
        let Some(manager) = self.registration(type_url)?.private else {
            return Err(KeysetError::NotPrivateKey { type_url: type_url.to_string() });
        };

        manager.public_key_data(private_key_data.material())
    }

    /// Construct the primitive for one key.
    pub fn primitive(&self, key_data: &KeyData) -> Result<Arc<dyn Primitive>, KeysetError> {
        self.key_manager(key_data.type_url())?.primitive(key_data.material())
    }

    /// Build the primitive set for `keyset`, resolving each key through this
    /// registry or through `key_manager` when given.
    pub fn primitives_with_key_manager(
        &self,
        keyset: &Keyset,
        key_manager: Option<&dyn KeyManager>,
    ) -> Result<PrimitiveSet, KeysetError> {
        PrimitiveSet::new(keyset, self, key_manager)
    }

    /// Non-owning handle to this registry.
    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry { inner: Arc::downgrade(&self.inner) }
    }

    fn registration(&self, type_url: &str) -> Result<Registration, KeysetError> {
        self.read()
            .managers
            .get(type_url)
            .cloned()
            .ok_or_else(|| KeysetError::UnknownKeyType { type_url: type_url.to_string() })
    }

    // Registration never leaves the map half-written, so a poisoned lock still
    // guards consistent state.
    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WeakRegistry {
    /// The registry, if it is still alive.
    pub fn upgrade(&self) -> Option<Registry> {
        self.inner.upgrade().map(|inner| Registry { inner })
    }
}
