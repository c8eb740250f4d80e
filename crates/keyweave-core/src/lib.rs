//! Keyweave Core
//!
//! Keyset composition and primitive wrapping. Applications ask for a
//! capability (AEAD, MAC, signatures, hybrid encryption, PRF, keyset
//! derivation) instead of an algorithm; a keyset of independently rotatable
//! keys is resolved into one object that implements that capability across
//! every key. Private keysets of signature and hybrid keys yield their public
//! counterpart through [`KeysetHandle::public_keyset_handle`].
//!
//! # Resolution Pipeline
//!
//! ```text
//! KeysetHandle ──▶ Registry ──▶ KeyManager::primitive (per key)
//!                                       │
//!                                       ▼
//!                      PrimitiveSet<dyn Primitive> (enabled keys only)
//!                                       │ into_capability::<dyn Aead>()
//!                                       ▼
//!                      PrimitiveSet<dyn Aead> ──▶ WrappedAead
//! ```
//!
//! For derivation, a set of `KeysetDeriver` keys feeds
//! [`keyderivation::WrappedKeysetDeriver`], which returns a brand-new
//! [`KeysetHandle`] usable like any other.
//!
//! # Invariants
//!
//! - A primitive set has exactly one primary entry and it is `Enabled`
//! - Encrypt-like operations always use the primary key and prepend its
//!   identification prefix
//! - Decrypt-like operations try prefix matches first, then `Raw` keys, and
//!   fail with one opaque error
//! - Derivation is deterministic: same PRF key, template and salt always
//!   yield byte-identical key material
//!
//! # Security
//!
//! - Key material is reachable only through [`InsecureSecretKeyAccess`]
//! - Key material and plaintext are never logged
//! - Registering a different manager for a known type URL fails

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
mod codec;
pub mod config;
pub mod crypto_format;
pub mod env;
pub mod error;
pub mod handle;
pub mod hybrid;
pub mod key_manager;
pub mod keyderivation;
pub mod keyset;
pub mod mac;
pub mod manager;
pub mod prf;
pub mod primitive;
pub mod primitive_set;
pub mod registry;
pub mod signature;
pub mod wrapper;

pub use env::{Environment, SystemEnv};
pub use error::{ErrorKind, KeysetError};
pub use handle::KeysetHandle;
pub use key_manager::{DerivableKeyManager, KeyManager, PrivateKeyManager};
pub use keyset::{
    InsecureSecretKeyAccess, Key, KeyData, KeyId, KeyInfo, KeyStatus, KeyTemplate, Keyset,
    KeysetInfo, OutputPrefixType,
};
pub use manager::KeysetManager;
pub use primitive::{
    Aead, Capability, HybridDecrypt, HybridEncrypt, KeysetDeriver, Mac, Prf, Primitive,
    PublicKeySign, PublicKeyVerify, StreamingPrf,
};
pub use primitive_set::{Entry, PrimitiveSet};
pub use registry::Registry;
pub use wrapper::PrimitiveWrapper;
