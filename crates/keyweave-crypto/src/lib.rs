//! Keyweave Cryptographic Building Blocks
//!
//! Algorithm implementations used by the keyweave key managers. Nothing in
//! this crate knows about keysets, key ids or output prefixes: each type wraps
//! exactly one key and exposes the raw operation. Functions are pure and
//! callers provide random bytes (nonces) so that every operation is
//! reproducible under test.
//!
//! # Building Blocks
//!
//! ```text
//! XChaCha20Poly1305Key ── seal / open ──────────▶ nonce ‖ ciphertext ‖ tag
//! HmacSha256Key ───────── compute / verify ─────▶ truncated tag
//! HkdfSha256Prf ───────── compute / stream ─────▶ pseudorandom bytes
//! Ed25519SigningKey ───── sign / verify ────────▶ 64-byte signature
//! X25519PublicKey ─────── seal / open ──────────▶ ephemeral key ‖ sealed message
//! ```
//!
//! # Security
//!
//! Key Hygiene:
//! - Key bytes are zeroized when the owning value is dropped
//! - Types never implement `Debug` output containing key bytes
//!
//! Authenticity:
//! - XChaCha20-Poly1305 rejects any modification of nonce, ciphertext, tag or
//!   associated data
//! - HMAC verification is constant time
//! - Ed25519 signing is deterministic and needs no randomness
//! - Hybrid encryption rejects low-order X25519 points on both sides
//!
//! Determinism:
//! - HKDF output for a fixed (key, salt, input) is identical on every call,
//!   which is what makes keyset derivation reproducible

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod error;
pub mod hybrid;
pub mod mac;
pub mod prf;
pub mod signature;

pub use aead::{
    POLY1305_TAG_SIZE, XCHACHA20_NONCE_SIZE, XCHACHA20_POLY1305_KEY_SIZE, XChaCha20Poly1305Key,
};
pub use error::CryptoError;
pub use hybrid::{X25519_HYBRID_OVERHEAD, X25519_KEY_SIZE, X25519PrivateKey, X25519PublicKey};
pub use mac::{HmacSha256Key, MAX_HMAC_KEY_SIZE, MAX_TAG_SIZE, MIN_HMAC_KEY_SIZE, MIN_TAG_SIZE};
pub use prf::{HKDF_SHA256_MAX_OUTPUT, HkdfSha256Prf, HkdfStream, MIN_HKDF_KEY_SIZE};
pub use signature::{
    ED25519_PUBLIC_KEY_SIZE, ED25519_SEED_SIZE, ED25519_SIGNATURE_SIZE, Ed25519SigningKey,
    Ed25519VerifyingKey,
};
