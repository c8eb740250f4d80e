//! Test harness for Keyweave.
//!
//! Deterministic environments, dummy key managers and keyset fixtures shared
//! by the integration tests and fuzz targets.
//!
//! # Dummy Key Managers
//!
//! The managers in [`managers`] build primitives whose behaviour is visible
//! from their output, so tests can tell which key handled an operation
//! without real cryptography.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod managers;
pub mod seeded_env;

pub use fixtures::{capture_logs, init_tracing, key, keyset, registry_with_builtins};
pub use managers::{
    DUMMY_AEAD_TYPE_URL, DUMMY_DERIVER_TYPE_URL, DummyAead, DummyAeadKeyManager, DummyDeriver,
    DummyDeriverKeyManager,
};
pub use seeded_env::SeededEnv;
