//! Boiling parameters.
//!
//! [`BoilerConfig`] is plain data: build it in code, or deserialize it from
//! the embedding application's own config file. Validation happens when it is
//! handed to [`crate::Boiler`], together with a self-check hash.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{PepperError, Result};

// These parameters should be increased regularly to keep boiling slow
// on new hardware.
pub const DEFAULT_TIME_COST: u32 = 2;
pub const DEFAULT_MEMORY_COST: u32 = 512;
pub const DEFAULT_PARALLELISM: u32 = 4;
pub const DEFAULT_HASH_LENGTH: usize = 32;
pub const DEFAULT_RANDOM_SALT_LENGTH: usize = 16;
pub const DEFAULT_PARAMETER_THRESHOLD: u32 = 4;

/// Cost and encoding options for boiling passwords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoilerConfig {
    /// Number of passes over memory.
    pub time_cost: u32,

    /// Memory usage in KiB.
    pub memory_cost: u32,

    /// Number of lanes.
    pub parallelism: u32,

    /// Length of the raw hash in bytes.
    pub hash_len: usize,

    /// Length of the random salt generated for each password.
    pub salt_len: usize,

    /// How many times our own cost parameters an encoded password may use
    /// before we refuse to process it.
    pub parameter_threshold: u32,

    /// Encoding applied to text passwords before hashing.
    pub encoding: TextEncoding,
}

impl Default for BoilerConfig {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST,
            parallelism: DEFAULT_PARALLELISM,
            hash_len: DEFAULT_HASH_LENGTH,
            salt_len: DEFAULT_RANDOM_SALT_LENGTH,
            parameter_threshold: DEFAULT_PARAMETER_THRESHOLD,
            encoding: TextEncoding::default(),
        }
    }
}

impl BoilerConfig {
    /// Check what can be checked without running the primitive.
    ///
    /// Cost combinations the primitive rejects are caught by the self-check.
    pub fn validate(&self) -> Result<()> {
        if self.parameter_threshold < 1 {
            return Err(PepperError::Parameter(
                "parameter_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Encoding used to turn text passwords into bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,

    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl TextEncoding {
    /// Encode `text`, failing on characters the encoding cannot represent.
    pub fn encode(self, text: &str) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            TextEncoding::Utf8 => Ok(Zeroizing::new(text.as_bytes().to_vec())),
            TextEncoding::Latin1 => {
                let mut bytes = Zeroizing::new(Vec::with_capacity(text.len()));
                for ch in text.chars() {
                    let byte = u8::try_from(u32::from(ch)).map_err(|_| {
                        PepperError::InvalidInput(
                            "password contains characters not representable in latin-1"
                                .to_string(),
                        )
                    })?;
                    bytes.push(byte);
                }
                Ok(bytes)
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextEncoding {
    type Err = PepperError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(PepperError::Parameter(format!(
                "unknown text encoding: {}",
                other
            ))),
        }
    }
}
