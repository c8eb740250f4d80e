//! Pseudorandom functions built on HKDF-SHA256
//!
//! `HkdfSha256Prf` treats HKDF as a keyed PRF: the key is the input keying
//! material, the salt is fixed per key and the PRF input becomes the HKDF
//! `info`. The streaming form yields exactly the bytes a one-shot expand would,
//! one 32-byte block at a time, so a consumer can read as much randomness as it
//! needs without knowing the length up front.

use std::io::{self, Read};

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

const HASH_SIZE: usize = 32;

/// Maximum HKDF-SHA256 output (255 blocks of 32 bytes)
pub const HKDF_SHA256_MAX_OUTPUT: usize = 255 * HASH_SIZE;

/// Minimum PRF key size (32 bytes)
pub const MIN_HKDF_KEY_SIZE: usize = 32;

/// HKDF-SHA256 keyed pseudorandom function.
///
/// Holds only the extracted pseudorandom key (PRK); the input keying material
/// and salt are not retained.
pub struct HkdfSha256Prf {
    prk: [u8; HASH_SIZE],
}

impl HkdfSha256Prf {
    /// Build a PRF from key material and an optional salt (empty = no salt).
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: key shorter than [`MIN_HKDF_KEY_SIZE`]
    pub fn new(key: &[u8], salt: &[u8]) -> Result<Self, CryptoError> {
        if key.len() < MIN_HKDF_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: MIN_HKDF_KEY_SIZE,
                actual: key.len(),
            });
        }

        Ok(Self { prk: extract(key, salt) })
    }

    /// Compute `output_len` pseudorandom bytes for `input`.
    ///
    /// # Errors
    ///
    /// - `OutputTooLong`: more than [`HKDF_SHA256_MAX_OUTPUT`] bytes requested
    pub fn compute(&self, input: &[u8], output_len: usize) -> Result<Vec<u8>, CryptoError> {
        let Ok(hkdf) = Hkdf::<Sha256>::from_prk(&self.prk) else {
            unreachable!("a 32-byte PRK is valid for HKDF-SHA256");
        };

        let mut output = vec![0u8; output_len];
        hkdf.expand(input, &mut output).map_err(|_| CryptoError::OutputTooLong {
            requested: output_len,
            maximum: HKDF_SHA256_MAX_OUTPUT,
        })?;

        Ok(output)
    }

    /// Pseudorandom byte stream for `input`.
    ///
    /// The stream ends (reads return 0) after [`HKDF_SHA256_MAX_OUTPUT`]
    /// bytes.
    pub fn stream(&self, input: &[u8]) -> HkdfStream {
        HkdfStream {
            prk: self.prk,
            info: input.to_vec(),
            block: [0u8; HASH_SIZE],
            counter: 0,
            offset: HASH_SIZE,
        }
    }
}

impl Drop for HkdfSha256Prf {
    fn drop(&mut self) {
        self.prk.zeroize();
    }
}

/// Incremental HKDF-Expand output.
///
/// Block `T(i) = HMAC(PRK, T(i-1) ‖ info ‖ i)` is computed only when the
/// previous block has been fully consumed.
pub struct HkdfStream {
    prk: [u8; HASH_SIZE],
    info: Vec<u8>,
    /// Current block `T(counter)`
    block: [u8; HASH_SIZE],
    /// Index of the current block; 0 before the first block
    counter: u8,
    /// Bytes of `block` already handed out
    offset: usize,
}

impl HkdfStream {
    /// Advance to the next block. Returns `false` once all 255 blocks are used.
    fn next_block(&mut self) -> bool {
        if self.counter == u8::MAX {
            return false;
        }

        let Ok(mut mac) = HmacSha256::new_from_slice(&self.prk) else {
            unreachable!("HMAC-SHA256 accepts any key size");
        };
        if self.counter > 0 {
            mac.update(&self.block);
        }
        mac.update(&self.info);
        self.counter += 1;
        mac.update(&[self.counter]);

        self.block.copy_from_slice(&mac.finalize().into_bytes());
        self.offset = 0;
        true
    }
}

impl Read for HkdfStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut written = 0;

        while written < buf.len() {
            if self.offset == HASH_SIZE && !self.next_block() {
                break;
            }

            let n = (HASH_SIZE - self.offset).min(buf.len() - written);
            buf[written..written + n].copy_from_slice(&self.block[self.offset..self.offset + n]);
            self.offset += n;
            written += n;
        }

        Ok(written)
    }
}

impl Drop for HkdfStream {
    fn drop(&mut self) {
        self.prk.zeroize();
        self.block.zeroize();
    }
}

/// HKDF-Extract. An empty salt means "no salt" (RFC 5869 zero-filled default).
fn extract(key: &[u8], salt: &[u8]) -> [u8; HASH_SIZE] {
    let salt = if salt.is_empty() { None } else { Some(salt) };
    let (prk, _) = Hkdf::<Sha256>::extract(salt, key);

    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&prk);
    out
}
