//! Fuzz target for keyset derivation
//!
//! Derives keysets from arbitrary salts with a multi-key deriver keyset.
//!
//! # Strategy
//!
//! - Arbitrary salts (empty, short, long)
//! - Pairs of salts that differ by one byte
//!
//! # Invariants
//!
//! - Derivation is deterministic (same salt → byte-identical keyset)
//! - Distinct salts produce distinct key material
//! - Derived keyset mirrors source key ids, statuses and prefix types
//! - Derived AEAD keys encrypt and decrypt

#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use keyweave_core::{
    Aead, InsecureSecretKeyAccess, KeyStatus, KeysetDeriver, KeysetHandle, KeysetManager,
    OutputPrefixType, Registry,
    aead::{self, WrappedAead},
    keyderivation::{self, WrappedKeysetDeriver},
    prf,
};
use keyweave_harness::{SeededEnv, registry_with_builtins};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    salt: Vec<u8>,
    flip_index: u16,
    flip_mask: u8,
}

struct Fixture {
    registry: Registry,
    source: KeysetHandle,
    deriver: WrappedKeysetDeriver,
}

fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let registry = registry_with_builtins(3).unwrap();
        let tink = keyderivation::prf_based_deriver_template(
            &prf::hkdf_sha256_template(),
            &aead::xchacha20_poly1305_template(),
        );
        let raw = keyderivation::prf_based_deriver_template(
            &prf::hkdf_sha256_template(),
            &aead::xchacha20_poly1305_raw_template(),
        );

        let mut manager = KeysetManager::with_registry(registry.clone(), SeededEnv::with_seed(4));
        manager.add(&raw, false).unwrap();
        manager.add(&tink, true).unwrap();
        let source = manager.handle().unwrap();
        let deriver = source.primitive_with(&registry).unwrap();

        Fixture { registry, source, deriver }
    })
}

fn material(handle: &KeysetHandle) -> Vec<Vec<u8>> {
    handle
        .insecure_keyset(InsecureSecretKeyAccess)
        .keys
        .iter()
        .map(|key| key.key_data.value(InsecureSecretKeyAccess).to_vec())
        .collect()
}

fn metadata(handle: &KeysetHandle) -> Vec<(u32, KeyStatus, OutputPrefixType)> {
    let info = handle.keyset_info();
    assert_eq!(info.primary_key_id, handle.primary_key_id());
    info.key_info.iter().map(|k| (k.key_id, k.status, k.output_prefix_type)).collect()
}

fuzz_target!(|scenario: Scenario| {
    let fixture = fixture();

    let first = fixture.deriver.derive_keyset(&scenario.salt).unwrap();
    let second = fixture.deriver.derive_keyset(&scenario.salt).unwrap();
    assert_eq!(material(&first), material(&second));
    assert_eq!(metadata(&first), metadata(&fixture.source));

    if scenario.flip_mask != 0 && !scenario.salt.is_empty() {
        let mut other = scenario.salt.clone();
        let index = scenario.flip_index as usize % other.len();
        other[index] ^= scenario.flip_mask;
        let third = fixture.deriver.derive_keyset(&other).unwrap();
        assert_ne!(material(&first), material(&third));
    }

    let aead: WrappedAead = first.primitive_with(&fixture.registry).unwrap();
    let ciphertext = aead.encrypt(&scenario.salt, b"").unwrap();
    assert_eq!(aead.decrypt(&ciphertext, b"").unwrap(), scenario.salt);
});
