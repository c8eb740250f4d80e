//! Message authentication using HMAC-SHA256 with truncated tags

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Minimum HMAC key size (16 bytes)
pub const MIN_HMAC_KEY_SIZE: usize = 16;

/// Maximum HMAC key size, one SHA-256 block (64 bytes)
pub const MAX_HMAC_KEY_SIZE: usize = 64;

/// Shortest tag accepted (10 bytes). Shorter tags are trivially forgeable.
pub const MIN_TAG_SIZE: usize = 10;

/// Longest tag, the full SHA-256 output (32 bytes)
pub const MAX_TAG_SIZE: usize = 32;

/// HMAC-SHA256 key with a fixed output tag size.
///
/// Tags are the leftmost `tag_size` bytes of the full HMAC output.
pub struct HmacSha256Key {
    key: Vec<u8>,
    tag_size: usize,
}

impl HmacSha256Key {
    /// Build a key producing `tag_size`-byte tags.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: key outside `MIN_HMAC_KEY_SIZE..=MAX_HMAC_KEY_SIZE`
    /// - `InvalidTagSize`: tag size outside `MIN_TAG_SIZE..=MAX_TAG_SIZE`
    pub fn new(key: &[u8], tag_size: usize) -> Result<Self, CryptoError> {
        if key.len() < MIN_HMAC_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: MIN_HMAC_KEY_SIZE,
                actual: key.len(),
            });
        }
        if key.len() > MAX_HMAC_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: MAX_HMAC_KEY_SIZE,
                actual: key.len(),
            });
        }
        if !(MIN_TAG_SIZE..=MAX_TAG_SIZE).contains(&tag_size) {
            return Err(CryptoError::InvalidTagSize { size: tag_size });
        }

        Ok(Self { key: key.to_vec(), tag_size })
    }

    /// Tag size in bytes.
    pub fn tag_size(&self) -> usize {
        self.tag_size
    }

    /// Compute the truncated tag over `data`.
    pub fn compute(&self, data: &[u8]) -> Vec<u8> {
        let mut tag = self.mac().chain_update(data).finalize().into_bytes().to_vec();
        tag.truncate(self.tag_size);
        tag
    }

    /// Verify `tag` over `data` in constant time.
    ///
    /// # Errors
    ///
    /// - `InvalidMac`: tag length differs from the configured size or the tag
    ///   does not match
    pub fn verify(&self, tag: &[u8], data: &[u8]) -> Result<(), CryptoError> {
        if tag.len() != self.tag_size {
            return Err(CryptoError::InvalidMac);
        }

        self.mac()
            .chain_update(data)
            .verify_truncated_left(tag)
            .map_err(|_| CryptoError::InvalidMac)
    }

    fn mac(&self) -> HmacSha256 {
        let Ok(mac) = HmacSha256::new_from_slice(&self.key) else {
            unreachable!("HMAC-SHA256 accepts any key size");
        };
        mac
    }
}

impl Drop for HmacSha256Key {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(tag_size: usize) -> HmacSha256Key {
        HmacSha256Key::new(b"0123456789abcdef0123456789abcdef", tag_size).unwrap()
    }

    #[test]
    fn compute_produces_configured_tag_size() {
        assert_eq!(test_key(16).compute(b"data").len(), 16);
        assert_eq!(test_key(32).compute(b"data").len(), 32);
    }

    #[test]
    fn compute_verify_roundtrip() {
        let key = test_key(16);
        let tag = key.compute(b"authenticated data");

        assert!(key.verify(&tag, b"authenticated data").is_ok());
    }

    #[test]
    fn truncated_tag_is_prefix_of_full_tag() {
        let short = test_key(10).compute(b"data");
        let full = test_key(32).compute(b"data");

        assert_eq!(&full[..10], short.as_slice());
    }

    #[test]
    fn rfc4231_case_2() {
        // "Jefe" is shorter than MIN_HMAC_KEY_SIZE, check the underlying HMAC
        let expected = "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843";
        let mut mac = HmacSha256::new_from_slice(b"Jefe").unwrap();
        mac.update(b"what do ya want for nothing?");
        assert_eq!(hex::encode(mac.finalize().into_bytes()), expected);
    }

    #[test]
    fn wrong_data_fails_verification() {
        let key = test_key(16);
        let tag = key.compute(b"original");

        assert_eq!(key.verify(&tag, b"modified"), Err(CryptoError::InvalidMac));
    }

    #[test]
    fn wrong_tag_length_fails_verification() {
        let key = test_key(16);
        let tag = key.compute(b"data");

        assert_eq!(key.verify(&tag[..15], b"data"), Err(CryptoError::InvalidMac));
    }

    #[test]
    fn different_keys_produce_different_tags() {
        let key_a = HmacSha256Key::new(&[0x01; 32], 16).unwrap();
        let key_b = HmacSha256Key::new(&[0x02; 32], 16).unwrap();

        assert_ne!(key_a.compute(b"data"), key_b.compute(b"data"));
    }

    #[test]
    fn rejects_short_key() {
        assert!(matches!(
            HmacSha256Key::new(&[0u8; 15], 16),
            Err(CryptoError::InvalidKeyLength { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn rejects_oversized_key() {
        assert!(HmacSha256Key::new(&[0u8; MAX_HMAC_KEY_SIZE], 16).is_ok());
        assert!(matches!(
            HmacSha256Key::new(&[0u8; 65], 16),
            Err(CryptoError::InvalidKeyLength { expected: 64, actual: 65 })
        ));
    }

    #[test]
    fn rejects_out_of_range_tag_size() {
        assert!(matches!(
            HmacSha256Key::new(&[0u8; 32], 9),
            Err(CryptoError::InvalidTagSize { size: 9 })
        ));
        assert!(matches!(
            HmacSha256Key::new(&[0u8; 32], 33),
            Err(CryptoError::InvalidTagSize { size: 33 })
        ));
    }
}
