//! CBOR encoding for serialized key material and key parameters.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::KeysetError;

pub(crate) fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    let mut data = Vec::new();
    let Ok(()) = ciborium::ser::into_writer(value, &mut data) else {
        unreachable!("CBOR encoding of plain key structs into a Vec cannot fail");
    };
    data
}

pub(crate) fn decode<T: DeserializeOwned>(data: &[u8], what: &str) -> Result<T, KeysetError> {
    ciborium::de::from_reader(data).map_err(|e| KeysetError::InvalidKeyMaterial {
        reason: format!("failed to decode {what}: {e}"),
    })
}
