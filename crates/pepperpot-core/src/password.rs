//! Password input.
//!
//! Hashing always runs on bytes. Text passwords are encoded with the
//! configured [`TextEncoding`]; byte passwords are used as given.

use std::fmt;

use zeroize::Zeroizing;

use crate::config::TextEncoding;
use crate::error::Result;

/// A password to boil or verify.
#[derive(Clone, Copy)]
pub enum Password<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl Password<'_> {
    /// Password bytes in a buffer that is cleared when dropped.
    pub(crate) fn to_bytes(self, encoding: TextEncoding) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            Password::Text(text) => encoding.encode(text),
            Password::Bytes(bytes) => Ok(Zeroizing::new(bytes.to_vec())),
        }
    }
}

impl fmt::Debug for Password<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Password::Text(_) => "Text",
            Password::Bytes(_) => "Bytes",
        };
        f.debug_tuple(kind).field(&"[REDACTED]").finish()
    }
}

impl<'a> From<&'a str> for Password<'a> {
    fn from(value: &'a str) -> Self {
        Password::Text(value)
    }
}

impl<'a> From<&'a String> for Password<'a> {
    fn from(value: &'a String) -> Self {
        Password::Text(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for Password<'a> {
    fn from(value: &'a [u8]) -> Self {
        Password::Bytes(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Password<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Password::Bytes(value.as_slice())
    }
}

impl<'a> From<&'a Vec<u8>> for Password<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Password::Bytes(value.as_slice())
    }
}
