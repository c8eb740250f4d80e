//! Tests for the AEAD wrapper.
//!
//! These tests verify the routing contract:
//! - Encryption always uses the primary key and prepends its prefix
//! - Decryption tries prefix matches first, then `Raw` keys
//! - Every failure is the same opaque error

use keyweave_core::{
    Aead, KeyData, KeyStatus, KeysetError, KeysetHandle, KeysetManager, OutputPrefixType,
    Registry,
    aead::{self, WrappedAead},
};
use keyweave_harness::{
    DUMMY_AEAD_TYPE_URL, DummyAead, DummyAeadKeyManager, DummyDeriverKeyManager, SeededEnv,
    init_tracing, key, keyset, registry_with_builtins,
};

fn dummy_registry() -> Registry {
    let registry = Registry::new();
    registry.register_key_manager(DummyAeadKeyManager, true).unwrap();
    registry.register_key_manager(DummyDeriverKeyManager::new(), true).unwrap();
    registry
}

fn dummy_key(name: &str) -> KeyData {
    KeyData::new(DUMMY_AEAD_TYPE_URL, name.as_bytes().to_vec())
}

fn wrap(primary: u32, keys: Vec<keyweave_core::Key>) -> WrappedAead {
    let handle = KeysetHandle::new(keyset(primary, keys)).unwrap();
    handle.primitive_with(&dummy_registry()).unwrap()
}

/// Raw key 1 plus Tink primary key 2.
fn raw_and_tink() -> WrappedAead {
    wrap(2, vec![
        key(1, KeyStatus::Enabled, OutputPrefixType::Raw, dummy_key("one")),
        key(2, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("two")),
    ])
}

#[test]
fn encrypt_prepends_primary_prefix() {
    init_tracing();
    let aead = raw_and_tink();

    let ciphertext = aead.encrypt(b"msg", b"").unwrap();

    assert_eq!(ciphertext, b"\x01\x00\x00\x00\x02\x03twomsg");
    assert_eq!(aead.decrypt(&ciphertext, b"").unwrap(), b"msg");
}

#[test]
fn raw_ciphertext_reaches_raw_key() {
    let aead = raw_and_tink();
    let ciphertext = DummyAead::new("one").encrypt(b"legacy data", b"").unwrap();

    assert_eq!(aead.decrypt(&ciphertext, b"").unwrap(), b"legacy data");
}

#[test]
fn raw_primary_produces_unprefixed_ciphertext() {
    let aead = wrap(1, vec![
        key(1, KeyStatus::Enabled, OutputPrefixType::Raw, dummy_key("one")),
        key(2, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("two")),
    ]);

    assert_eq!(aead.encrypt(b"m", b"").unwrap(), b"\x03onem");
}

#[test]
fn legacy_and_crunchy_share_zero_start_byte() {
    let aead = wrap(3, vec![
        key(1, KeyStatus::Enabled, OutputPrefixType::Legacy, dummy_key("legacy")),
        key(2, KeyStatus::Enabled, OutputPrefixType::Crunchy, dummy_key("crunchy")),
        key(3, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("tink")),
    ]);

    let mut legacy = vec![0x00, 0, 0, 0, 1];
    legacy.extend(DummyAead::new("legacy").encrypt(b"a", b"").unwrap());
    let mut crunchy = vec![0x00, 0, 0, 0, 2];
    crunchy.extend(DummyAead::new("crunchy").encrypt(b"b", b"").unwrap());

    assert_eq!(aead.decrypt(&legacy, b"").unwrap(), b"a");
    assert_eq!(aead.decrypt(&crunchy, b"").unwrap(), b"b");
}

#[test]
fn colliding_prefixes_are_all_tried() {
    let aead = wrap(9, vec![
        key(7, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("first")),
        key(7, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("second")),
        key(9, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("primary")),
    ]);

    let mut ciphertext = vec![0x01, 0, 0, 0, 7];
    ciphertext.extend(DummyAead::new("second").encrypt(b"collided", b"").unwrap());

    assert_eq!(aead.decrypt(&ciphertext, b"").unwrap(), b"collided");
}

#[test]
fn prefix_sized_input_is_only_offered_to_raw_keys() {
    let aead = wrap(2, vec![
        key(1, KeyStatus::Enabled, OutputPrefixType::Raw, dummy_key("\x00\x00\x02")),
        key(2, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("two")),
    ]);

    // Raw key "\0\0\x02" tags with [3, 0, 0, 2]; with an empty plaintext the
    // ciphertext is [3, 0, 0, 2], shorter than a prefix
    assert_eq!(aead.decrypt(&[3, 0, 0, 2], b"").unwrap(), b"");
    assert!(aead.decrypt(&[0x01, 0, 0, 0, 2], b"").is_err());
}

#[test]
fn disabled_key_no_longer_decrypts() {
    let with_old = wrap(2, vec![
        key(1, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("old")),
        key(2, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("new")),
    ]);
    let without_old = wrap(2, vec![
        key(1, KeyStatus::Disabled, OutputPrefixType::Tink, dummy_key("old")),
        key(2, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("new")),
    ]);

    let mut ciphertext = vec![0x01, 0, 0, 0, 1];
    ciphertext.extend(DummyAead::new("old").encrypt(b"m", b"").unwrap());

    assert!(with_old.decrypt(&ciphertext, b"").is_ok());
    assert_eq!(
        without_old.decrypt(&ciphertext, b""),
        Err(KeysetError::OperationFailed { operation: "decrypt" })
    );
}

#[test]
fn every_failure_is_the_same_error() {
    let aead = raw_and_tink();
    let valid = aead.encrypt(b"msg", b"").unwrap();
    let opaque = Err(KeysetError::OperationFailed { operation: "decrypt" });

    assert_eq!(aead.decrypt(b"", b""), opaque);
    assert_eq!(aead.decrypt(&valid[..7], b""), opaque);
    assert_eq!(aead.decrypt(&[0x01, 0, 0, 0, 99, 3, b't', b'w', b'o'], b""), opaque);
    assert_eq!(aead.decrypt(b"unrelated bytes", b""), opaque);
}

#[test]
fn wrap_requires_aead_capability() {
    let handle = KeysetHandle::new(keyset(1, vec![key(
        1,
        KeyStatus::Enabled,
        OutputPrefixType::Tink,
        KeyData::new(keyweave_harness::DUMMY_DERIVER_TYPE_URL, b"deriver".to_vec()),
    )]))
    .unwrap();

    let result = handle.primitive_with::<WrappedAead>(&dummy_registry());
    assert!(matches!(result, Err(KeysetError::Validation { capability: "aead", .. })));
}

#[test]
fn malformed_key_fails_at_construction() {
    let handle = KeysetHandle::new(keyset(1, vec![
        key(1, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("fine")),
        key(2, KeyStatus::Enabled, OutputPrefixType::Tink, dummy_key("")),
    ]))
    .unwrap();

    let result = handle.primitive_with::<WrappedAead>(&dummy_registry());
    assert!(matches!(result, Err(KeysetError::KeyConstruction { key_id: 2, .. })));
}

#[test]
fn key_manager_override_resolves_every_key() {
    let handle = KeysetHandle::new(keyset(1, vec![key(
        1,
        KeyStatus::Enabled,
        OutputPrefixType::Raw,
        dummy_key("override"),
    )]))
    .unwrap();

    let aead: WrappedAead = handle.primitive_with_key_manager(&DummyAeadKeyManager).unwrap();
    assert_eq!(aead.encrypt(b"x", b"").unwrap(), b"\x08overridex");
}

#[test]
fn rotation_keeps_old_ciphertext_readable() {
    let registry = registry_with_builtins(11).unwrap();
    let mut manager = KeysetManager::with_registry(registry.clone(), SeededEnv::with_seed(12));

    let old = manager.add(&aead::xchacha20_poly1305_template(), true).unwrap();
    let old_aead: WrappedAead = manager.handle().unwrap().primitive_with(&registry).unwrap();
    let old_ciphertext = old_aead.encrypt(b"before rotation", b"ad").unwrap();

    let new = manager.add(&aead::xchacha20_poly1305_template(), true).unwrap();
    let aead: WrappedAead = manager.handle().unwrap().primitive_with(&registry).unwrap();
    let new_ciphertext = aead.encrypt(b"after rotation", b"ad").unwrap();

    assert_eq!(&old_ciphertext[1..5], &old.to_be_bytes());
    assert_eq!(&new_ciphertext[1..5], &new.to_be_bytes());
    assert_eq!(aead.decrypt(&old_ciphertext, b"ad").unwrap(), b"before rotation");
    assert_eq!(aead.decrypt(&new_ciphertext, b"ad").unwrap(), b"after rotation");
    assert!(aead.decrypt(&new_ciphertext, b"other ad").is_err());
}
