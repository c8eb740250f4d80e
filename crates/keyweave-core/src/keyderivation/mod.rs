//! Keyset derivation.
//!
//! A deriver key turns a salt into a brand-new keyset, deterministically:
//! the same deriver key, salt and derived-key template always produce
//! byte-identical key material. [`PrfBasedDeriver`] feeds an HKDF stream
//! keyed by the salt into the derived type's key manager;
//! [`WrappedKeysetDeriver`] runs it once per source key and rebuilds a keyset
//! whose metadata mirrors the source.
//!
//! ```text
//! salt ──► HKDF(prf_key).stream(salt) ──► registry.derive_key(template)
//!                                                    │
//!                                                    ▼
//!                                              derived KeyData
//! ```

mod prf_based;
mod wrapper;

pub use prf_based::{PRF_BASED_DERIVER_TYPE_URL, PrfBasedDeriver, PrfBasedDeriverKeyManager};
pub use wrapper::WrappedKeysetDeriver;

use crate::keyset::KeyTemplate;

/// Deriver whose PRF key comes from `prf` and whose output keys follow
/// `derived`.
///
/// The deriver key takes the prefix type of `derived`, so derived keys are
/// routed the same way the derived template asks for.
pub fn prf_based_deriver_template(prf: &KeyTemplate, derived: &KeyTemplate) -> KeyTemplate {
    prf_based::template(prf.clone(), derived.clone())
}
