//! Length-prefixed protocol strings.
//!
//! Wire layout:
//!
//! ```text
//! ┌────────────┬──────────────────────────┬─────────────────┐
//! │ length: u32│ length bytes (incl. NUL) │ zero padding to │
//! │            │                          │ 4-byte boundary │
//! └────────────┴──────────────────────────┴─────────────────┘
//! ```
//!
//! The length counts the implicit NUL terminator. In memory a
//! [`WlString`] stores exactly `length` bytes; on the wire it occupies
//! `align4(length) + 4` bytes.

use bytes::Bytes;

use super::primitives::{align4, decode_uint, WORD_SIZE};
use crate::error::{Result, WaylinkError};

/// An owned protocol string, NUL terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WlString {
    bytes: Bytes,
}

impl WlString {
    /// Decode a string from raw wire bytes: a u32 length followed by
    /// that many bytes of data.
    ///
    /// Fails with a framing error if the slice is too short for the
    /// declared length.
    pub fn from_wire(data: &[u8]) -> Result<Self> {
        if data.len() < WORD_SIZE {
            return Err(WaylinkError::Framing(
                "truncated string: missing length word".into(),
            ));
        }

        let len = decode_uint(data) as usize;
        let body = data
            .get(WORD_SIZE..WORD_SIZE + len)
            .ok_or_else(|| {
                WaylinkError::Framing(format!(
                    "truncated string: declared {} bytes, {} available",
                    len,
                    data.len() - WORD_SIZE
                ))
            })?;

        Ok(Self {
            bytes: Bytes::copy_from_slice(body),
        })
    }

    /// Byte count as carried on the wire, NUL terminator included.
    pub fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of 4-byte words the padded string body occupies.
    pub fn word_size(&self) -> u32 {
        align4(self.size()) / WORD_SIZE as u32
    }

    /// Total wire footprint: padded body plus the length word.
    pub fn serialised_size(&self) -> u32 {
        align4(self.size()) + WORD_SIZE as u32
    }

    /// Raw bytes, NUL terminator included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The string content without the trailing NUL, if valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        let body = match self.bytes.split_last() {
            Some((0, body)) => body,
            _ => &self.bytes[..],
        };
        std::str::from_utf8(body).ok()
    }
}

impl From<&str> for WlString {
    /// Build an outbound string, appending the NUL terminator.
    fn from(s: &str) -> Self {
        let mut bytes = Vec::with_capacity(s.len() + 1);
        bytes.extend_from_slice(s.as_bytes());
        bytes.push(0);
        Self {
            bytes: Bytes::from(bytes),
        }
    }
}

impl PartialEq<str> for WlString {
    /// Compare against a plain string, ignoring the NUL terminator.
    /// Used for interface-name matching during registry enumeration.
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for WlString {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

impl std::fmt::Display for WlString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => write!(f, "{:?}", self.bytes),
        }
    }
}
