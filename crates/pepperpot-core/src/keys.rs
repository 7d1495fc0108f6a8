//! Server-side secrets and key rotation.
//!
//! A [`KeyRing`] is an ordered list of `(keyid, secret)` pairs. The first
//! pair is the current key and signs every newly boiled password; the rest are
//! kept so passwords boiled with them still verify. To rotate, prepend a new
//! key and keep the old ones around until their passwords have been re-boiled
//! (see [`crate::Boiler::needs_update`]).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretBox};

use crate::encoding::{is_b64_char, MAX_KEYID_LEN};
use crate::error::{PepperError, Result};

struct KeyEntry {
    keyid: String,
    secret: SecretBox<[u8]>,
}

/// Ordered set of server-side secrets, first one current.
pub struct KeyRing {
    entries: Vec<KeyEntry>,
    index: HashMap<String, usize>,
}

impl KeyRing {
    /// Build a key ring from `(keyid, secret)` pairs, current key first.
    ///
    /// # Errors
    ///
    /// Returns `PepperError::Parameter` if the list is empty, a keyid is not
    /// 1-11 characters of `[A-Za-z0-9+/]`, or a secret is empty.
    /// Returns `PepperError::DuplicateKeyId` if a keyid appears twice.
    pub fn new<I, K, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: AsRef<[u8]>,
    {
        let mut entries = Vec::new();
        let mut index = HashMap::new();

        for (keyid, secret) in pairs {
            let keyid = keyid.into();
            validate_keyid(&keyid)?;

            let secret = secret.as_ref();
            if secret.is_empty() {
                return Err(PepperError::Parameter(format!(
                    "secret for keyid {} must not be empty",
                    keyid
                )));
            }

            if index.contains_key(&keyid) {
                return Err(PepperError::DuplicateKeyId(keyid));
            }
            index.insert(keyid.clone(), entries.len());
            entries.push(KeyEntry {
                keyid,
                secret: SecretBox::new(secret.to_vec().into_boxed_slice()),
            });
        }

        if entries.is_empty() {
            return Err(PepperError::Parameter(
                "at least one secret is required".to_string(),
            ));
        }

        Ok(Self { entries, index })
    }

    /// Keyid of the key used for new passwords.
    pub fn current_keyid(&self) -> &str {
        &self.entries[0].keyid
    }

    pub(crate) fn current_secret(&self) -> &[u8] {
        self.entries[0].secret.expose_secret()
    }

    /// Secret for `keyid`, if we hold it.
    pub(crate) fn secret(&self, keyid: &str) -> Option<&[u8]> {
        self.index
            .get(keyid)
            .map(|&i| self.entries[i].secret.expose_secret())
    }

    pub fn contains(&self, keyid: &str) -> bool {
        self.index.contains_key(keyid)
    }

    /// All keyids, current first.
    pub fn keyids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.keyid.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses the delimited form `keyid:secret,keyid:secret`, current key first.
///
/// Only the first `:` of each pair separates keyid from secret, so secrets
/// may contain colons but not commas.
impl FromStr for KeyRing {
    type Err = PepperError;

    fn from_str(s: &str) -> Result<Self> {
        let mut pairs = Vec::new();
        for pair in s.split(',') {
            let (keyid, secret) = pair.split_once(':').ok_or_else(|| {
                PepperError::Parameter("secret pair must be keyid:secret".to_string())
            })?;
            pairs.push((keyid, secret));
        }
        Self::new(pairs)
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("keyids", &self.keyids().collect::<Vec<_>>())
            .field("secrets", &"[REDACTED]")
            .finish()
    }
}

fn validate_keyid(keyid: &str) -> Result<()> {
    if keyid.is_empty() || keyid.len() > MAX_KEYID_LEN || !keyid.bytes().all(is_b64_char) {
        return Err(PepperError::Parameter(format!(
            "keyid must be 1-{} characters of [A-Za-z0-9+/], got {:?}",
            MAX_KEYID_LEN, keyid
        )));
    }
    Ok(())
}
