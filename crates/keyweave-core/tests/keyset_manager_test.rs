//! Tests for keyset rotation through the keyset manager.

use std::collections::HashSet;

use keyweave_core::{
    InsecureSecretKeyAccess, KeyStatus, KeysetError, KeysetHandle, KeysetManager, OutputPrefixType,
    Registry,
    aead::{self, XCHACHA20_POLY1305_TYPE_URL, XChaCha20Poly1305KeyManager},
};
use keyweave_harness::{SeededEnv, registry_with_builtins};

fn manager(seed: u64) -> (Registry, KeysetManager<SeededEnv>) {
    let registry = registry_with_builtins(seed).unwrap();
    let keys = KeysetManager::with_registry(registry.clone(), SeededEnv::with_seed(seed + 1));
    (registry, keys)
}

fn status(handle: &KeysetHandle, key_id: u32) -> KeyStatus {
    handle.keyset_info().key_info.iter().find(|k| k.key_id == key_id).unwrap().status
}

#[test]
fn empty_manager_has_no_handle() {
    let (_, keys) = manager(91);
    assert_eq!(keys.key_count(), 0);
    assert!(matches!(keys.handle(), Err(KeysetError::InvalidKeyset { .. })));
}

#[test]
fn key_ids_are_unique() {
    let (_, mut keys) = manager(93);
    let mut ids = HashSet::new();
    for _ in 0..64 {
        assert!(ids.insert(keys.add(&aead::xchacha20_poly1305_template(), true).unwrap()));
    }
    assert_eq!(keys.key_count(), 64);
}

#[test]
fn same_seed_generates_same_ids() {
    let (_, mut first) = manager(95);
    let (_, mut second) = manager(95);

    let template = aead::xchacha20_poly1305_template();
    assert_eq!(first.add(&template, true).unwrap(), second.add(&template, true).unwrap());
}

#[test]
fn primary_key_is_protected() {
    let (_, mut keys) = manager(97);
    let primary = keys.add(&aead::xchacha20_poly1305_template(), true).unwrap();

    for result in [keys.disable(primary), keys.destroy(primary), keys.delete(primary)] {
        let Err(KeysetError::PrimaryKeyOperation { key_id, .. }) = result else {
            panic!("expected PrimaryKeyOperation, got {result:?}");
        };
        assert_eq!(key_id, primary);
    }
}

#[test]
fn full_rotation_cycle() {
    let (_, mut keys) = manager(99);
    let old = keys.add(&aead::xchacha20_poly1305_template(), true).unwrap();
    let new = keys.add(&aead::xchacha20_poly1305_template(), false).unwrap();
    assert_eq!(keys.handle().unwrap().primary_key_id(), old);

    keys.set_primary(new).unwrap();
    keys.disable(old).unwrap();
    assert_eq!(status(&keys.handle().unwrap(), old), KeyStatus::Disabled);

    keys.enable(old).unwrap();
    keys.disable(old).unwrap();
    keys.destroy(old).unwrap();
    let handle = keys.handle().unwrap();
    assert_eq!(status(&handle, old), KeyStatus::Destroyed);

    let destroyed = handle
        .insecure_keyset(InsecureSecretKeyAccess)
        .keys
        .iter()
        .find(|k| k.key_id == old)
        .unwrap();
    assert!(destroyed.key_data.value(InsecureSecretKeyAccess).is_empty());
    assert_eq!(destroyed.key_data.type_url(), XCHACHA20_POLY1305_TYPE_URL);

    assert!(matches!(keys.enable(old), Err(KeysetError::InvalidKeyset { .. })));
    keys.delete(old).unwrap();
    assert_eq!(keys.key_count(), 1);
    assert!(matches!(keys.delete(old), Err(KeysetError::KeyNotFound { .. })));
}

#[test]
fn disabled_key_cannot_become_primary() {
    let (_, mut keys) = manager(101);
    keys.add(&aead::xchacha20_poly1305_template(), true).unwrap();
    let other = keys.add(&aead::xchacha20_poly1305_template(), false).unwrap();
    keys.disable(other).unwrap();

    assert!(matches!(keys.set_primary(other), Err(KeysetError::InvalidKeyset { .. })));
    assert!(matches!(keys.set_primary(12345), Err(KeysetError::KeyNotFound { key_id: 12345 })));
}

#[test]
fn unknown_prefix_template_is_rejected() {
    let (_, mut keys) = manager(103);
    let mut template = aead::xchacha20_poly1305_template();
    template.output_prefix_type = OutputPrefixType::Unknown;

    assert!(matches!(keys.add(&template, true), Err(KeysetError::InvalidTemplate { .. })));
    assert_eq!(keys.key_count(), 0);
}

#[test]
fn unknown_key_type_is_rejected() {
    let (_, mut keys) = manager(105);
    let mut template = aead::xchacha20_poly1305_template();
    template.type_url = "type.keyweave.test/Missing".to_string();

    assert!(matches!(keys.add(&template, true), Err(KeysetError::UnknownKeyType { .. })));
}

#[test]
fn disallowed_new_keys_block_add() {
    let registry = Registry::new();
    let manager = XChaCha20Poly1305KeyManager::new(SeededEnv::with_seed(1));
    registry.register_derivable_key_manager(manager, false).unwrap();
    let mut keys = KeysetManager::with_registry(registry, SeededEnv::with_seed(2));

    assert!(matches!(
        keys.add(&aead::xchacha20_poly1305_template(), true),
        Err(KeysetError::NewKeyNotAllowed { .. })
    ));
}

#[test]
fn manager_starts_from_existing_handle() {
    let (registry, mut keys) = manager(107);
    let first = keys.add(&aead::xchacha20_poly1305_template(), true).unwrap();
    let handle = keys.handle().unwrap();

    let mut resumed = KeysetManager::from_handle_with(&handle, registry, SeededEnv::with_seed(108));
    let second = resumed.add(&aead::xchacha20_poly1305_template(), true).unwrap();

    let rotated = resumed.handle().unwrap();
    assert_eq!(rotated.primary_key_id(), second);
    assert_eq!(status(&rotated, first), KeyStatus::Enabled);
    // The original handle is unchanged
    assert_eq!(handle.keyset_info().key_info.len(), 1);
}
