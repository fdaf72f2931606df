// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the implementation of `ByteString`.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// An opaque sequence of bytes. A null byte string is distinct from an
/// empty one; browse continuation points use the null state to signal
/// that a result is complete.
#[derive(Eq, PartialEq, Clone, Debug, Hash, PartialOrd, Ord, Default)]
pub struct ByteString {
    /// The raw bytes, `None` for the null byte string.
    pub value: Option<Vec<u8>>,
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        if let Some(ref value) = self.value {
            value
        } else {
            &[]
        }
    }
}

impl From<&[u8]> for ByteString {
    fn from(value: &[u8]) -> Self {
        ByteString {
            value: Some(value.to_vec()),
        }
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        ByteString { value: Some(value) }
    }
}

impl ByteString {
    /// Creates a null byte string.
    pub fn null() -> ByteString {
        ByteString { value: None }
    }

    /// Tests if the byte string is null.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Tests if the byte string is null or empty.
    pub fn is_null_or_empty(&self) -> bool {
        self.value.as_ref().map_or(true, |v| v.is_empty())
    }

    /// Creates a byte string from a base64 encoded string, `None` if the
    /// input is not valid base64.
    pub fn from_base64(data: &str) -> Option<ByteString> {
        STANDARD.decode(data).map(Self::from).ok()
    }

    /// Encodes the byte string as base64. The null byte string encodes as
    /// the empty string.
    pub fn as_base64(&self) -> String {
        match self.value {
            Some(ref value) => STANDARD.encode(value),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trip() {
        let bytes = ByteString::from(vec![0x10u8, 0x20, 0x30, 0xff]);
        let encoded = bytes.as_base64();
        assert_eq!(ByteString::from_base64(&encoded), Some(bytes));
    }

    #[test]
    fn null_encodes_empty() {
        assert_eq!(ByteString::null().as_base64(), "");
        assert!(ByteString::null().is_null_or_empty());
        assert!(!ByteString::from(vec![1u8]).is_null_or_empty());
    }
}
