//! Capability traits and the conversion from constructed primitives.
//!
//! A key manager returns an `Arc<dyn Primitive>`. Which capabilities that
//! object offers is answered by its `into_*` methods: each is an explicit,
//! fallible conversion that returns `None` unless the concrete type opts in.
//! [`Capability`] ties each `dyn Trait` to its conversion so a primitive set
//! can be converted generically and fail with a typed error when any entry
//! lacks the capability.

use std::{io::Read, sync::Arc};

use crate::{error::KeysetError, handle::KeysetHandle};

/// Authenticated encryption with associated data.
pub trait Aead: Send + Sync {
    /// Encrypt `plaintext`, authenticating `associated_data`.
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, KeysetError>;

    /// Decrypt and authenticate `ciphertext`.
    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>, KeysetError>;
}

/// Message authentication code.
pub trait Mac: Send + Sync {
    /// Compute a tag over `data`.
    fn compute_mac(&self, data: &[u8]) -> Result<Vec<u8>, KeysetError>;

    /// Verify `tag` over `data`.
    fn verify_mac(&self, tag: &[u8], data: &[u8]) -> Result<(), KeysetError>;
}

/// Digital signature creation.
pub trait PublicKeySign: Send + Sync {
    /// Sign `data`.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, KeysetError>;
}

/// Digital signature verification.
pub trait PublicKeyVerify: Send + Sync {
    /// Verify `signature` over `data`.
    fn verify(&self, signature: &[u8], data: &[u8]) -> Result<(), KeysetError>;
}

/// Public-key encryption to a recipient.
pub trait HybridEncrypt: Send + Sync {
    /// Encrypt `plaintext`, binding it to `context_info`.
    fn encrypt(&self, plaintext: &[u8], context_info: &[u8]) -> Result<Vec<u8>, KeysetError>;
}

/// Decryption with the recipient's private key.
pub trait HybridDecrypt: Send + Sync {
    /// Decrypt `ciphertext` produced with the same `context_info`.
    fn decrypt(&self, ciphertext: &[u8], context_info: &[u8]) -> Result<Vec<u8>, KeysetError>;
}

/// Fixed-length pseudorandom function.
pub trait Prf: Send + Sync {
    /// `output_len` pseudorandom bytes for `input`.
    fn compute(&self, input: &[u8], output_len: usize) -> Result<Vec<u8>, KeysetError>;
}

/// Pseudorandom function with unbounded (streamed) output.
pub trait StreamingPrf: Send + Sync {
    /// Pseudorandom byte stream for `input`.
    fn compute_stream(&self, input: &[u8]) -> Result<Box<dyn Read + Send>, KeysetError>;
}

/// Deterministic derivation of a new keyset from a salt.
pub trait KeysetDeriver: Send + Sync {
    /// Derive a keyset from `salt`.
    fn derive_keyset(&self, salt: &[u8]) -> Result<KeysetHandle, KeysetError>;
}

/// Object constructed by a key manager from one key's material.
///
/// Implementors override the conversions for each capability they provide.
pub trait Primitive: Send + Sync + 'static {
    /// View as [`Aead`].
    fn into_aead(self: Arc<Self>) -> Option<Arc<dyn Aead>> {
        None
    }

    /// View as [`Mac`].
    fn into_mac(self: Arc<Self>) -> Option<Arc<dyn Mac>> {
        None
    }

    /// View as [`PublicKeySign`].
    fn into_public_key_sign(self: Arc<Self>) -> Option<Arc<dyn PublicKeySign>> {
        None
    }

    /// View as [`PublicKeyVerify`].
    fn into_public_key_verify(self: Arc<Self>) -> Option<Arc<dyn PublicKeyVerify>> {
        None
    }

    /// View as [`HybridEncrypt`].
    fn into_hybrid_encrypt(self: Arc<Self>) -> Option<Arc<dyn HybridEncrypt>> {
        None
    }

    /// View as [`HybridDecrypt`].
    fn into_hybrid_decrypt(self: Arc<Self>) -> Option<Arc<dyn HybridDecrypt>> {
        None
    }

    /// View as [`Prf`].
    fn into_prf(self: Arc<Self>) -> Option<Arc<dyn Prf>> {
        None
    }

    /// View as [`StreamingPrf`].
    fn into_streaming_prf(self: Arc<Self>) -> Option<Arc<dyn StreamingPrf>> {
        None
    }

    /// View as [`KeysetDeriver`].
    fn into_keyset_deriver(self: Arc<Self>) -> Option<Arc<dyn KeysetDeriver>> {
        None
    }
}

/// A capability a primitive set can be converted to.
pub trait Capability: Send + Sync + 'static {
    /// Name used in validation errors
    const NAME: &'static str;

    /// Convert a constructed primitive, `None` if it lacks the capability.
    fn from_primitive(primitive: Arc<dyn Primitive>) -> Option<Arc<Self>>;
}

impl Capability for dyn Aead {
    const NAME: &'static str = "aead";

    fn from_primitive(primitive: Arc<dyn Primitive>) -> Option<Arc<Self>> {
        primitive.into_aead()
    }
}

impl Capability for dyn Mac {
    const NAME: &'static str = "mac";

    fn from_primitive(primitive: Arc<dyn Primitive>) -> Option<Arc<Self>> {
        primitive.into_mac()
    }
}

impl Capability for dyn PublicKeySign {
    const NAME: &'static str = "public key sign";

    fn from_primitive(primitive: Arc<dyn Primitive>) -> Option<Arc<Self>> {
        primitive.into_public_key_sign()
    }
}

impl Capability for dyn PublicKeyVerify {
    const NAME: &'static str = "public key verify";

    fn from_primitive(primitive: Arc<dyn Primitive>) -> Option<Arc<Self>> {
        primitive.into_public_key_verify()
    }
}

impl Capability for dyn HybridEncrypt {
    const NAME: &'static str = "hybrid encrypt";

    fn from_primitive(primitive: Arc<dyn Primitive>) -> Option<Arc<Self>> {
        primitive.into_hybrid_encrypt()
    }
}

impl Capability for dyn HybridDecrypt {
    const NAME: &'static str = "hybrid decrypt";

    fn from_primitive(primitive: Arc<dyn Primitive>) -> Option<Arc<Self>> {
        primitive.into_hybrid_decrypt()
    }
}

impl Capability for dyn Prf {
    const NAME: &'static str = "prf";

    fn from_primitive(primitive: Arc<dyn Primitive>) -> Option<Arc<Self>> {
        primitive.into_prf()
    }
}

impl Capability for dyn StreamingPrf {
    const NAME: &'static str = "streaming prf";

    fn from_primitive(primitive: Arc<dyn Primitive>) -> Option<Arc<Self>> {
        primitive.into_streaming_prf()
    }
}

impl Capability for dyn KeysetDeriver {
    const NAME: &'static str = "keyset deriver";

    fn from_primitive(primitive: Arc<dyn Primitive>) -> Option<Arc<Self>> {
        primitive.into_keyset_deriver()
    }
}
