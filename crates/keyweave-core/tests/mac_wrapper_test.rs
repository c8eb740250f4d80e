//! Tests for the MAC wrapper.
//!
//! These tests verify:
//! - Tags carry the primary key's prefix
//! - `Legacy` keys authenticate `data ‖ 0x00`
//! - Tags of prefix length or shorter never verify
//! - Old tags verify after rotation

use keyweave_core::{
    InsecureSecretKeyAccess, KeyStatus, KeysetError, KeysetHandle, KeysetManager, Mac,
    OutputPrefixType, Registry,
    mac::{self, WrappedMac},
};
use keyweave_harness::{SeededEnv, init_tracing, key, keyset, registry_with_builtins};

fn manager(registry: &Registry, seed: u64) -> KeysetManager<SeededEnv> {
    KeysetManager::with_registry(registry.clone(), SeededEnv::with_seed(seed))
}

fn wrap(registry: &Registry, handle: &KeysetHandle) -> WrappedMac {
    handle.primitive_with(registry).unwrap()
}

/// Same key material as the single key of `handle`, relabelled with `prefix`.
fn relabel(handle: &KeysetHandle, prefix: OutputPrefixType) -> KeysetHandle {
    let source = &handle.insecure_keyset(InsecureSecretKeyAccess).keys[0];
    KeysetHandle::new(keyset(source.key_id, vec![key(
        source.key_id,
        KeyStatus::Enabled,
        prefix,
        source.key_data.clone(),
    )]))
    .unwrap()
}

#[test]
fn tag_carries_primary_prefix() {
    init_tracing();
    let registry = registry_with_builtins(21).unwrap();
    let mut keys = manager(&registry, 22);
    let primary = keys.add(&mac::hmac_sha256_template(32, 16), true).unwrap();
    let mac = wrap(&registry, &keys.handle().unwrap());

    let tag = mac.compute_mac(b"data").unwrap();

    assert_eq!(tag.len(), 5 + 16);
    assert_eq!(tag[0], 0x01);
    assert_eq!(&tag[1..5], &primary.to_be_bytes());
    mac.verify_mac(&tag, b"data").unwrap();
    assert!(mac.verify_mac(&tag, b"other").is_err());
}

#[test]
fn legacy_key_authenticates_suffixed_data() {
    let registry = registry_with_builtins(23).unwrap();
    let mut keys = manager(&registry, 24);
    let mut template = mac::hmac_sha256_template(32, 16);
    template.output_prefix_type = OutputPrefixType::Legacy;
    keys.add(&template, true).unwrap();
    let legacy_handle = keys.handle().unwrap();

    let tag = wrap(&registry, &legacy_handle).compute_mac(b"data").unwrap();
    assert_eq!(tag[0], 0x00);

    let raw = wrap(&registry, &relabel(&legacy_handle, OutputPrefixType::Raw));
    assert_eq!(raw.compute_mac(b"data\x00").unwrap(), &tag[5..]);
    assert_ne!(raw.compute_mac(b"data").unwrap(), &tag[5..]);
}

#[test]
fn short_tags_never_verify() {
    let registry = registry_with_builtins(25).unwrap();
    let mut keys = manager(&registry, 26);
    let primary = keys.add(&mac::hmac_sha256_template(32, 10), true).unwrap();
    keys.add(&mac::hmac_sha256_raw_template(32, 10), false).unwrap();
    let mac = wrap(&registry, &keys.handle().unwrap());

    let mut prefix_only = vec![0x01];
    prefix_only.extend_from_slice(&primary.to_be_bytes());

    let opaque = Err(KeysetError::OperationFailed { operation: "verify mac" });
    assert_eq!(mac.verify_mac(&prefix_only, b""), opaque);
    assert_eq!(mac.verify_mac(&[], b""), opaque);
    assert_eq!(mac.verify_mac(&[0x01, 0, 0], b""), opaque);
}

#[test]
fn raw_tags_verify_through_fallback() {
    let registry = registry_with_builtins(27).unwrap();
    let mut raw_only = manager(&registry, 28);
    raw_only.add(&mac::hmac_sha256_raw_template(32, 32), true).unwrap();
    let raw_handle = raw_only.handle().unwrap();
    let raw_tag = wrap(&registry, &raw_handle).compute_mac(b"data").unwrap();
    assert_eq!(raw_tag.len(), 32);

    let mut rotated = KeysetManager::from_handle_with(
        &raw_handle,
        registry.clone(),
        SeededEnv::with_seed(29),
    );
    rotated.add(&mac::hmac_sha256_template(32, 16), true).unwrap();
    let mac = wrap(&registry, &rotated.handle().unwrap());

    mac.verify_mac(&raw_tag, b"data").unwrap();
}

#[test]
fn old_tags_verify_until_key_is_disabled() {
    let registry = registry_with_builtins(30).unwrap();
    let mut keys = manager(&registry, 31);
    let old = keys.add(&mac::hmac_sha256_template(32, 16), true).unwrap();
    let old_tag = wrap(&registry, &keys.handle().unwrap()).compute_mac(b"data").unwrap();

    keys.add(&mac::hmac_sha256_template(32, 16), true).unwrap();
    wrap(&registry, &keys.handle().unwrap()).verify_mac(&old_tag, b"data").unwrap();

    keys.disable(old).unwrap();
    let mac = wrap(&registry, &keys.handle().unwrap());
    assert!(mac.verify_mac(&old_tag, b"data").is_err());
}
