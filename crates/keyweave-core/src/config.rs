//! Registration of the built-in key managers.
//!
//! ```ignore
//! keyweave_core::config::register_defaults()?;
//! let handle = KeysetHandle::generate_new(&aead::xchacha20_poly1305_template())?;
//! let aead = handle.primitive::<WrappedAead>()?;
//! ```

use crate::{
    aead::XChaCha20Poly1305KeyManager,
    env::{Environment, SystemEnv},
    error::KeysetError,
    hybrid::{X25519HybridPrivateKeyManager, X25519HybridPublicKeyManager},
    keyderivation::PrfBasedDeriverKeyManager,
    mac::HmacKeyManager,
    prf::HkdfPrfKeyManager,
    registry::Registry,
    signature::{Ed25519PrivateKeyManager, Ed25519PublicKeyManager},
};

/// Which built-in key managers to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// `XChaCha20-Poly1305` AEAD keys
    pub aead: bool,
    /// HMAC-SHA256 keys
    pub mac: bool,
    /// Ed25519 private and public keys
    pub signature: bool,
    /// X25519 hybrid encryption private and public keys
    pub hybrid: bool,
    /// HKDF-SHA256 PRF keys
    pub prf: bool,
    /// PRF-based keyset deriver keys
    pub key_derivation: bool,
    /// Whether the registered managers may generate new keys
    pub new_keys_allowed: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            aead: true,
            mac: true,
            signature: true,
            hybrid: true,
            prf: true,
            key_derivation: true,
            new_keys_allowed: true,
        }
    }
}

/// Register the managers selected by `config` in `registry`.
///
/// Safe to call repeatedly with the same configuration.
///
/// # Errors
///
/// - `ManagerConflict`: a different manager already owns a built-in type URL
/// - `NewKeyAllowedConflict`: new keys were disallowed by an earlier call
pub fn register<E: Environment>(
    registry: &Registry,
    config: &RegistryConfig,
    env: E,
) -> Result<(), KeysetError> {
    let new_keys = config.new_keys_allowed;

    if config.aead {
        let manager = XChaCha20Poly1305KeyManager::new(env.clone());
        registry.register_derivable_key_manager(manager, new_keys)?;
    }
    if config.mac {
        registry.register_derivable_key_manager(HmacKeyManager::new(env.clone()), new_keys)?;
    }
    if config.signature {
        let manager = Ed25519PrivateKeyManager::new(env.clone());
        registry.register_private_key_manager(manager, new_keys)?;
        // Public keys only ever come from private keysets
        registry.register_key_manager(Ed25519PublicKeyManager, false)?;
    }
    if config.hybrid {
        let manager = X25519HybridPrivateKeyManager::new(env.clone());
        registry.register_private_key_manager(manager, new_keys)?;
        let manager = X25519HybridPublicKeyManager::new(env.clone());
        registry.register_key_manager(manager, false)?;
    }
    if config.prf {
        registry.register_key_manager(HkdfPrfKeyManager::new(env.clone()), new_keys)?;
    }
    if config.key_derivation {
        registry.register_key_manager(
            PrfBasedDeriverKeyManager::new(registry.downgrade(), env),
            new_keys,
        )?;
    }

    tracing::debug!(?config, "registered built-in key managers");
    Ok(())
}

/// Register every built-in manager in the global registry.
pub fn register_defaults() -> Result<(), KeysetError> {
    register(Registry::global(), &RegistryConfig::default(), SystemEnv)
}
