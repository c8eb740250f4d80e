//! Fuzz target for wrapped decrypt and MAC verification
//!
//! Feeds adversarial ciphertexts and tags into wrapped primitives built over a
//! keyset mixing every prefix type.
//!
//! # Strategy
//!
//! - Random bytes: arbitrary input, with and without a forged key prefix
//! - Truncation: valid output cut at an arbitrary length
//! - Bit flips: valid output with one byte altered
//!
//! # Invariants
//!
//! - NEVER panic on any input
//! - Truncated or altered output never authenticates
//! - Unaltered output always authenticates

#![no_main]

use std::sync::OnceLock;

use arbitrary::Arbitrary;
use keyweave_core::{
    Aead, KeysetHandle, KeysetManager, Mac, OutputPrefixType, Registry,
    aead::{self, WrappedAead},
    mac::{self, WrappedMac},
};
use keyweave_harness::{SeededEnv, registry_with_builtins};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
enum Attack {
    RandomBytes { bytes: Vec<u8> },
    ForgedPrefix { key_index: u8, tink: bool, payload: Vec<u8> },
    Truncate { message: Vec<u8>, keep: u16 },
    FlipByte { message: Vec<u8>, index: u16, mask: u8 },
}

struct Fixture {
    aead: WrappedAead,
    mac: WrappedMac,
    key_ids: Vec<u32>,
}

fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let registry = registry_with_builtins(1).unwrap();
        let aead_handle = mixed_handle(&registry, |prefix| match prefix {
            OutputPrefixType::Raw => aead::xchacha20_poly1305_raw_template(),
            _ => {
                let mut template = aead::xchacha20_poly1305_template();
                template.output_prefix_type = prefix;
                template
            },
        });
        let mac_handle = mixed_handle(&registry, |prefix| {
            let mut template = mac::hmac_sha256_template(32, 16);
            template.output_prefix_type = prefix;
            template
        });

        Fixture {
            key_ids: aead_handle.keyset_info().key_info.iter().map(|k| k.key_id).collect(),
            aead: aead_handle.primitive_with(&registry).unwrap(),
            mac: mac_handle.primitive_with(&registry).unwrap(),
        }
    })
}

fn mixed_handle(
    registry: &Registry,
    template: impl Fn(OutputPrefixType) -> keyweave_core::KeyTemplate,
) -> KeysetHandle {
    let mut manager = KeysetManager::with_registry(registry.clone(), SeededEnv::with_seed(2));
    for (prefix, primary) in [
        (OutputPrefixType::Raw, false),
        (OutputPrefixType::Legacy, false),
        (OutputPrefixType::Crunchy, false),
        (OutputPrefixType::Tink, true),
    ] {
        manager.add(&template(prefix), primary).unwrap();
    }
    manager.handle().unwrap()
}

fuzz_target!(|attack: Attack| {
    let fixture = fixture();

    match attack {
        Attack::RandomBytes { bytes } => {
            let _ = fixture.aead.decrypt(&bytes, b"");
            let _ = fixture.mac.verify_mac(&bytes, b"");
        },

        Attack::ForgedPrefix { key_index, tink, payload } => {
            let key_id = fixture.key_ids[key_index as usize % fixture.key_ids.len()];
            let mut input = vec![if tink { 0x01 } else { 0x00 }];
            input.extend_from_slice(&key_id.to_be_bytes());
            input.extend_from_slice(&payload);

            assert!(fixture.aead.decrypt(&input, b"").is_err());
            assert!(fixture.mac.verify_mac(&input, b"").is_err());
        },

        Attack::Truncate { message, keep } => {
            let ciphertext = fixture.aead.encrypt(&message, b"ad").unwrap();
            assert_eq!(fixture.aead.decrypt(&ciphertext, b"ad").unwrap(), message);
            let keep = keep as usize % ciphertext.len();
            assert!(fixture.aead.decrypt(&ciphertext[..keep], b"ad").is_err());

            let tag = fixture.mac.compute_mac(&message).unwrap();
            fixture.mac.verify_mac(&tag, &message).unwrap();
            let keep = keep % tag.len();
            assert!(fixture.mac.verify_mac(&tag[..keep], &message).is_err());
        },

        Attack::FlipByte { message, index, mask } => {
            if mask == 0 {
                return;
            }
            let mut ciphertext = fixture.aead.encrypt(&message, b"").unwrap();
            let index = index as usize % ciphertext.len();
            ciphertext[index] ^= mask;
            assert!(fixture.aead.decrypt(&ciphertext, b"").is_err());

            let mut tag = fixture.mac.compute_mac(&message).unwrap();
            let index = index % tag.len();
            tag[index] ^= mask;
            assert!(fixture.mac.verify_mac(&tag, &message).is_err());
        },
    }
});
