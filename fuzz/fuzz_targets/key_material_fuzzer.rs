//! Fuzz target for serialized key material and templates
//!
//! Every built-in key manager parses CBOR key material and parameters, and
//! private key managers derive public key data from it. Feed them arbitrary
//! bytes.
//!
//! # Invariants
//!
//! - NEVER panic on malformed material or parameters
//! - Malformed input fails with an error, never a half-built primitive

#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use keyweave_core::{
    KeyData, KeyTemplate, OutputPrefixType, Registry,
    aead::XCHACHA20_POLY1305_TYPE_URL,
    hybrid::{X25519_HYBRID_PRIVATE_KEY_TYPE_URL, X25519_HYBRID_PUBLIC_KEY_TYPE_URL},
    keyderivation::PRF_BASED_DERIVER_TYPE_URL,
    mac::HMAC_TYPE_URL,
    prf::HKDF_PRF_TYPE_URL,
    signature::{ED25519_PRIVATE_KEY_TYPE_URL, ED25519_PUBLIC_KEY_TYPE_URL},
};
use keyweave_harness::registry_with_builtins;
use libfuzzer_sys::fuzz_target;

const TYPE_URLS: [&str; 8] = [
    XCHACHA20_POLY1305_TYPE_URL,
    HMAC_TYPE_URL,
    ED25519_PRIVATE_KEY_TYPE_URL,
    ED25519_PUBLIC_KEY_TYPE_URL,
    X25519_HYBRID_PRIVATE_KEY_TYPE_URL,
    X25519_HYBRID_PUBLIC_KEY_TYPE_URL,
    HKDF_PRF_TYPE_URL,
    PRF_BASED_DERIVER_TYPE_URL,
];

#[derive(Debug, Clone, Arbitrary)]
struct Input {
    type_index: u8,
    bytes: Vec<u8>,
    randomness: Vec<u8>,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| registry_with_builtins(5).unwrap())
}

fuzz_target!(|input: Input| {
    let registry = registry();
    let type_url = TYPE_URLS[input.type_index as usize % TYPE_URLS.len()];

    let key_data = KeyData::new(type_url, input.bytes.clone());
    let _ = registry.primitive(&key_data);
    let _ = registry.public_key_data(&key_data);

    let template = KeyTemplate {
        type_url: type_url.to_string(),
        value: input.bytes,
        output_prefix_type: OutputPrefixType::Tink,
    };
    let _ = registry.new_key_data(&template);
    let _ = registry.derive_key(&template, &mut input.randomness.as_slice());
});
