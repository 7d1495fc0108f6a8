//! Encoded password records.
//!
//! The canonical text form is
//!
//! ```text
//! $argon2i$v=19$m=512,t=2,p=4,keyid=key1$<salt>$<hash>
//! ```
//!
//! following the PHC string format with an extra `keyid` parameter naming the
//! server-side secret the record was boiled with. Salt and hash are standard
//! base64 without padding. The encoded string is the only thing callers need
//! to store.
//!
//! Parsing is strict: the whole input must match, and anything longer than
//! [`MAX_ENCODED_LEN`] is refused before it is looked at, so corrupt values
//! pulled from storage can't make us do unbounded work.

use std::fmt;
use std::str::FromStr;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{PepperError, Result};
use crate::primitive::ARGON2_VERSION_10;

/// Longest encoded password we will parse.
pub const MAX_ENCODED_LEN: usize = 265;

pub const MAX_KEYID_LEN: usize = 11;
const MAX_DATA_LEN: usize = 43;
const SALT_B64_LEN: (usize, usize) = (11, 64);
const HASH_B64_LEN: (usize, usize) = (16, 86);
const PREFIX: &str = "$argon2i$";

/// Standard alphabet, no padding on encode, padding optional on decode.
const B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// A parsed encoded password.
///
/// Salt and digest are cleared when the record is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncodedRecord {
    pub version: u32,
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub keyid: Option<String>,
    pub salt: Vec<u8>,
    pub raw_hash: Vec<u8>,
}

impl EncodedRecord {
    /// Parse an encoded password.
    ///
    /// # Errors
    ///
    /// Returns `PepperError::MalformedEncoding` if the input is longer than
    /// [`MAX_ENCODED_LEN`] or does not match the record grammar. The length
    /// is checked first; nothing else looks at untrusted input before this.
    pub fn parse(encoded: &str) -> Result<Self> {
        check_length(encoded)?;
        parse_record(encoded).ok_or_else(|| {
            PepperError::MalformedEncoding("Encoded password is on unknown format".to_string())
        })
    }

    /// Canonical text form; the version is always written.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl FromStr for EncodedRecord {
    type Err = PepperError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for EncodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}v={}$m={},t={},p={}",
            PREFIX, self.version, self.memory_cost, self.time_cost, self.parallelism
        )?;
        if let Some(keyid) = &self.keyid {
            write!(f, ",keyid={}", keyid)?;
        }
        write!(f, "${}${}", B64.encode(&self.salt), B64.encode(&self.raw_hash))
    }
}

impl fmt::Debug for EncodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedRecord")
            .field("version", &self.version)
            .field("memory_cost", &self.memory_cost)
            .field("time_cost", &self.time_cost)
            .field("parallelism", &self.parallelism)
            .field("keyid", &self.keyid)
            .field("salt_len", &self.salt.len())
            .field("hash_len", &self.raw_hash.len())
            .finish()
    }
}

/// Refuse oversized input before any other processing.
fn check_length(encoded: &str) -> Result<()> {
    if encoded.len() > MAX_ENCODED_LEN {
        return Err(PepperError::MalformedEncoding(format!(
            "Encoded password exceeds maximum length of {}, was {}",
            MAX_ENCODED_LEN,
            encoded.len()
        )));
    }
    Ok(())
}

pub(crate) fn is_b64_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'/'
}

fn parse_record(encoded: &str) -> Option<EncodedRecord> {
    let rest = encoded.strip_prefix(PREFIX)?;

    let (version, rest) = match rest.strip_prefix("v=") {
        Some(rest) => {
            let (digits, rest) = rest.split_once('$')?;
            (parse_number(digits, 3)?, rest)
        }
        // Only version 0x13 writes the version into the encoded string
        None => (ARGON2_VERSION_10, rest),
    };

    let mut sections = rest.split('$');
    let params = sections.next()?;
    let salt = sections.next()?;
    let hash = sections.next()?;
    if sections.next().is_some() {
        return None;
    }

    let mut fields = params.split(',');
    let memory_cost = parse_number(fields.next()?.strip_prefix("m=")?, 10)?;
    let time_cost = parse_number(fields.next()?.strip_prefix("t=")?, 10)?;
    let parallelism = parse_number(fields.next()?.strip_prefix("p=")?, 3)?;

    let mut keyid = None;
    let mut field = fields.next();
    if let Some(value) = field.and_then(|f| f.strip_prefix("keyid=")) {
        if !is_b64_run(value, 0, MAX_KEYID_LEN) {
            return None;
        }
        if !value.is_empty() {
            keyid = Some(value.to_string());
        }
        field = fields.next();
    }
    // Reserved; accepted and dropped.
    if let Some(value) = field.and_then(|f| f.strip_prefix("data=")) {
        if !is_b64_run(value, 0, MAX_DATA_LEN) {
            return None;
        }
        field = fields.next();
    }
    if field.is_some() {
        return None;
    }

    if !is_b64_run(salt, SALT_B64_LEN.0, SALT_B64_LEN.1)
        || !is_b64_run(hash, HASH_B64_LEN.0, HASH_B64_LEN.1)
    {
        return None;
    }

    Some(EncodedRecord {
        version,
        memory_cost,
        time_cost,
        parallelism,
        keyid,
        salt: B64.decode(salt).ok()?,
        raw_hash: B64.decode(hash).ok()?,
    })
}

/// 1 to `max_digits` ASCII digits that fit in a `u32`.
fn parse_number(digits: &str, max_digits: usize) -> Option<u32> {
    if digits.is_empty() || digits.len() > max_digits || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

fn is_b64_run(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.len()) && value.bytes().all(is_b64_char)
}
