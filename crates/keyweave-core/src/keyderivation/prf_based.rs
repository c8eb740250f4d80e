//! PRF-based deriver key manager and primitive.
//!
//! Serialized key: CBOR `{ version, prf_key, derived_key_template }` where
//! `prf_key` is an HKDF [`KeyData`].
//! Serialized parameters: CBOR `{ prf_key_template, derived_key_template }`.
//!
//! The PRF is always instantiated through a local HKDF manager, never through
//! the registry, so derivation does not depend on what is registered for the
//! HKDF type URL.
//!
//! # Invariants
//!
//! - The derived-key template names a derivable type; checked when the
//!   deriver is constructed, not on first use
//! - Derived handles carry placeholder metadata (id 0, `Unknown` status and
//!   prefix type)

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    codec,
    env::{Environment, SystemEnv},
    error::KeysetError,
    handle::KeysetHandle,
    key_manager::KeyManager,
    keyset::{KeyData, KeyTemplate},
    prf::{HKDF_PRF_TYPE_URL, HkdfPrf, HkdfPrfKeyManager},
    primitive::{KeysetDeriver, Primitive, StreamingPrf},
    registry::{Registry, WeakRegistry},
};

/// Type URL of PRF-based deriver keys
pub const PRF_BASED_DERIVER_TYPE_URL: &str = "type.keyweave.dev/PrfBasedDeriverKey";

const KEY_VERSION: u32 = 0;

#[derive(Serialize, Deserialize)]
struct PrfBasedDeriverKeyMaterial {
    version: u32,
    prf_key: KeyData,
    derived_key_template: KeyTemplate,
}

#[derive(Serialize, Deserialize)]
struct PrfBasedDeriverParams {
    prf_key_template: KeyTemplate,
    derived_key_template: KeyTemplate,
}

pub(super) fn template(prf_key_template: KeyTemplate, derived: KeyTemplate) -> KeyTemplate {
    let output_prefix_type = derived.output_prefix_type;
    KeyTemplate {
        type_url: PRF_BASED_DERIVER_TYPE_URL.to_string(),
        value: codec::encode(&PrfBasedDeriverParams {
            prf_key_template,
            derived_key_template: derived,
        }),
        output_prefix_type,
    }
}

/// Key manager for [`PRF_BASED_DERIVER_TYPE_URL`].
///
/// Holds a weak handle to the registry it lives in; derived keys are built by
/// whatever derivable managers that registry holds at derivation time.
#[derive(Clone)]
pub struct PrfBasedDeriverKeyManager<E: Environment = SystemEnv> {
    registry: WeakRegistry,
    prf_manager: HkdfPrfKeyManager<E>,
}

impl<E: Environment> PrfBasedDeriverKeyManager<E> {
    /// Manager resolving derived key types through `registry`, generating new
    /// PRF keys from `env`.
    pub fn new(registry: WeakRegistry, env: E) -> Self {
        Self { registry, prf_manager: HkdfPrfKeyManager::new(env) }
    }

    fn registry(&self) -> Result<Registry, KeysetError> {
        self.registry.upgrade().ok_or_else(|| KeysetError::InvalidKeyMaterial {
            reason: "registry backing the deriver was dropped".to_string(),
        })
    }
}

impl<E: Environment> KeyManager for PrfBasedDeriverKeyManager<E> {
    fn type_url(&self) -> &str {
        PRF_BASED_DERIVER_TYPE_URL
    }

    fn primitive(&self, serialized_key: &[u8]) -> Result<Arc<dyn Primitive>, KeysetError> {
        let material: PrfBasedDeriverKeyMaterial =
            codec::decode(serialized_key, "PRF-based deriver key")?;
        if material.version != KEY_VERSION {
            return Err(KeysetError::InvalidKeyMaterial {
                reason: format!("unsupported PRF-based deriver key version {}", material.version),
            });
        }

        let deriver = PrfBasedDeriver::new(
            &material.prf_key,
            material.derived_key_template,
            self.registry()?,
        )?;
        Ok(Arc::new(deriver))
    }

    fn new_key_data(&self, serialized_params: &[u8]) -> Result<KeyData, KeysetError> {
        let params: PrfBasedDeriverParams =
            codec::decode(serialized_params, "PRF-based deriver params")?;
        if params.prf_key_template.type_url != HKDF_PRF_TYPE_URL {
            return Err(KeysetError::InvalidTemplate {
                reason: format!(
                    "PRF key template must be {HKDF_PRF_TYPE_URL}, got {}",
                    params.prf_key_template.type_url
                ),
            });
        }

        let derived_type = &params.derived_key_template.type_url;
        if !self.registry()?.can_derive_keys(derived_type) {
            return Err(KeysetError::UnsupportedDerivationType { type_url: derived_type.clone() });
        }

        let prf_key = self.prf_manager.new_key_data(&params.prf_key_template.value)?;
        let material = PrfBasedDeriverKeyMaterial {
            version: KEY_VERSION,
            prf_key,
            derived_key_template: params.derived_key_template,
        };
        Ok(KeyData::new(PRF_BASED_DERIVER_TYPE_URL, codec::encode(&material)))
    }
}

/// Derives single-key keysets from a salt.
pub struct PrfBasedDeriver {
    prf: HkdfPrf,
    derived_key_template: KeyTemplate,
    registry: Registry,
}

impl PrfBasedDeriver {
    /// Validate the PRF key and the derived-key template.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyMaterial`: `prf_key` is not a well-formed HKDF key
    /// - `UnsupportedDerivationType`: `registry` cannot derive keys of the
    ///   template's type
    pub fn new(
        prf_key: &KeyData,
        derived_key_template: KeyTemplate,
        registry: Registry,
    ) -> Result<Self, KeysetError> {
        if prf_key.type_url() != HKDF_PRF_TYPE_URL {
            return Err(KeysetError::InvalidKeyMaterial {
                reason: format!("unsupported PRF key type {}", prf_key.type_url()),
            });
        }
        let prf = HkdfPrf::from_key_material(prf_key.material())?;

        if !registry.can_derive_keys(&derived_key_template.type_url) {
            return Err(KeysetError::UnsupportedDerivationType {
                type_url: derived_key_template.type_url,
            });
        }

        Ok(Self { prf, derived_key_template, registry })
    }
}

impl KeysetDeriver for PrfBasedDeriver {
    fn derive_keyset(&self, salt: &[u8]) -> Result<KeysetHandle, KeysetError> {
        let mut randomness = self.prf.compute_stream(salt)?;

        let key_data = self
            .registry
            .derive_key(&self.derived_key_template, &mut randomness)
            .map_err(|err| match err {
                KeysetError::UnsupportedDerivationType { .. }
                | KeysetError::DerivationFailed { .. } => err,
                other => KeysetError::DerivationFailed { reason: other.to_string() },
            })?;

        Ok(KeysetHandle::derived_placeholder(key_data))
    }
}

impl Primitive for PrfBasedDeriver {
    fn into_keyset_deriver(self: Arc<Self>) -> Option<Arc<dyn KeysetDeriver>> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aead::{self, XChaCha20Poly1305KeyManager},
        keyset::{InsecureSecretKeyAccess, KeyStatus, OutputPrefixType},
        prf,
    };

    fn registry() -> Registry {
        let registry = Registry::new();
        registry
            .register_derivable_key_manager(XChaCha20Poly1305KeyManager::new(SystemEnv), true)
            .unwrap();
        registry.register_key_manager(HkdfPrfKeyManager::new(SystemEnv), true).unwrap();
        registry
    }

    fn prf_key() -> KeyData {
        HkdfPrfKeyManager::new(SystemEnv)
            .new_key_data(&prf::hkdf_sha256_template().value)
            .unwrap()
    }

    fn derived_bytes(deriver: &PrfBasedDeriver, salt: &[u8]) -> Vec<u8> {
        let handle = deriver.derive_keyset(salt).unwrap();
        let keyset = handle.insecure_keyset(InsecureSecretKeyAccess);
        keyset.keys[0].key_data.value(InsecureSecretKeyAccess).to_vec()
    }

    #[test]
    fn same_salt_derives_same_key() {
        let deriver =
            PrfBasedDeriver::new(&prf_key(), aead::xchacha20_poly1305_template(), registry())
                .unwrap();

        assert_eq!(derived_bytes(&deriver, b"a"), derived_bytes(&deriver, b"a"));
        assert_ne!(derived_bytes(&deriver, b"a"), derived_bytes(&deriver, b"b"));
    }

    #[test]
    fn derived_handle_has_placeholder_metadata() {
        let deriver =
            PrfBasedDeriver::new(&prf_key(), aead::xchacha20_poly1305_template(), registry())
                .unwrap();
        let info = deriver.derive_keyset(b"salt").unwrap().keyset_info();

        assert_eq!(info.primary_key_id, 0);
        assert_eq!(info.key_info.len(), 1);
        assert_eq!(info.key_info[0].key_id, 0);
        assert_eq!(info.key_info[0].status, KeyStatus::Unknown);
        assert_eq!(info.key_info[0].output_prefix_type, OutputPrefixType::Unknown);
    }

    #[test]
    fn non_derivable_template_is_rejected_at_construction() {
        let result = PrfBasedDeriver::new(&prf_key(), prf::hkdf_sha256_template(), registry());

        let Err(KeysetError::UnsupportedDerivationType { type_url }) = result else {
            panic!("expected UnsupportedDerivationType");
        };
        assert_eq!(type_url, HKDF_PRF_TYPE_URL);
    }

    #[test]
    fn prf_key_must_be_hkdf() {
        let aead_key = KeyData::new(aead::XCHACHA20_POLY1305_TYPE_URL, vec![0; 40]);
        let result =
            PrfBasedDeriver::new(&aead_key, aead::xchacha20_poly1305_template(), registry());

        assert!(matches!(result, Err(KeysetError::InvalidKeyMaterial { .. })));
    }

    #[test]
    fn new_key_data_checks_derived_type() {
        let registry = registry();
        let manager = PrfBasedDeriverKeyManager::new(registry.downgrade(), SystemEnv);

        let derivable =
            template(prf::hkdf_sha256_template(), aead::xchacha20_poly1305_template());
        let key_data = manager.new_key_data(&derivable.value).unwrap();
        assert!(manager.primitive(key_data.material()).unwrap().into_keyset_deriver().is_some());

        let underivable = template(prf::hkdf_sha256_template(), prf::hkdf_sha256_template());
        assert!(matches!(
            manager.new_key_data(&underivable.value),
            Err(KeysetError::UnsupportedDerivationType { .. })
        ));
    }

    #[test]
    fn template_takes_derived_prefix_type() {
        let raw = template(prf::hkdf_sha256_template(), aead::xchacha20_poly1305_raw_template());
        assert_eq!(raw.output_prefix_type, OutputPrefixType::Raw);
        assert_eq!(raw.type_url, PRF_BASED_DERIVER_TYPE_URL);
    }

    #[test]
    fn dropped_registry_fails_construction() {
        let registry = registry();
        let manager = PrfBasedDeriverKeyManager::new(registry.downgrade(), SystemEnv);
        let params = template(prf::hkdf_sha256_template(), aead::xchacha20_poly1305_template());
        let key_data = manager.new_key_data(&params.value).unwrap();
        drop(registry);

        assert!(matches!(
            manager.primitive(key_data.material()),
            Err(KeysetError::InvalidKeyMaterial { .. })
        ));
    }
}
