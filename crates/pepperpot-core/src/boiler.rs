//! Boiling and verifying passwords.
//!
//! [`Boiler`] ties the pieces together: it holds the configuration and key
//! ring, generates salts, calls the hash primitive, and turns primitive
//! failures into [`PepperError`]s.
//!
//! ```no_run
//! use pepperpot_core::{Boiler, BoilerConfig, KeyRing};
//!
//! let keys = KeyRing::new([("key1", "secret1")])?;
//! let boiler = Boiler::new(keys, BoilerConfig::default())?;
//!
//! let encoded = boiler.boil("password")?;
//! assert!(boiler.verify("password", &encoded)?);
//! assert!(!boiler.verify("wrong", &encoded)?);
//! # Ok::<(), pepperpot_core::PepperError>(())
//! ```

use std::fmt;

use zeroize::Zeroizing;

use crate::config::BoilerConfig;
use crate::encoding::EncodedRecord;
use crate::error::{PepperError, Result};
use crate::keys::KeyRing;
use crate::password::Password;
use crate::policy::{check_threshold, is_stale};
use crate::primitive::{
    Argon2i, ErrorCode, HashContext, HashPrimitive, Verification, ARGON2_VERSION_NUMBER,
};

/// Password hashed by the construction-time self-check.
const SELF_CHECK_PASSWORD: &str = "dummy";

/// Boils passwords with server-side secrets and sensible defaults.
///
/// Read-only after construction; share it between threads by reference.
pub struct Boiler<P: HashPrimitive = Argon2i> {
    config: BoilerConfig,
    keys: KeyRing,
    primitive: P,
}

impl<P: HashPrimitive> fmt::Debug for Boiler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Boiler")
            .field("config", &self.config)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl Boiler<Argon2i> {
    /// Create a boiler backed by Argon2i.
    ///
    /// Boils one password before returning, so a parameter combination the
    /// primitive rejects fails here instead of on the first real call.
    ///
    /// # Errors
    ///
    /// Returns `PepperError::Parameter` for invalid parameters and
    /// `PepperError::Operational` if the self-check could not get the memory
    /// or threads it needs.
    pub fn new(keys: KeyRing, config: BoilerConfig) -> Result<Self> {
        Self::with_primitive(Argon2i, keys, config)
    }
}

impl<P: HashPrimitive> Boiler<P> {
    /// Create a boiler backed by `primitive`. See [`Boiler::new`].
    pub fn with_primitive(primitive: P, keys: KeyRing, config: BoilerConfig) -> Result<Self> {
        config.validate()?;
        let boiler = Self {
            config,
            keys,
            primitive,
        };
        boiler.self_check()?;
        Ok(boiler)
    }

    pub fn config(&self) -> &BoilerConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeyRing {
        &self.keys
    }

    /// Boil `password` with a fresh random salt and the current key.
    ///
    /// Returns the encoded password to store.
    ///
    /// # Errors
    ///
    /// Returns `PepperError::Operational` if the primitive could not allocate
    /// memory or spawn threads, or the OS could not provide randomness.
    /// Returns `PepperError::InvalidInput` if a text password can't be
    /// represented in the configured encoding.
    pub fn boil<'a>(&self, password: impl Into<Password<'a>>) -> Result<String> {
        let password = password.into().to_bytes(self.config.encoding)?;
        let salt = random_salt(self.config.salt_len)?;

        let ctx = HashContext {
            password: &password,
            salt: &salt,
            secret: Some(self.keys.current_secret()),
            associated_data: &[],
            time_cost: self.config.time_cost,
            memory_cost: self.config.memory_cost,
            parallelism: self.config.parallelism,
            hash_len: self.config.hash_len,
            version: ARGON2_VERSION_NUMBER,
        };
        let raw_hash = self.primitive.compute(&ctx).map_err(classify)?;

        let record = EncodedRecord {
            version: ARGON2_VERSION_NUMBER,
            memory_cost: self.config.memory_cost,
            time_cost: self.config.time_cost,
            parallelism: self.config.parallelism,
            keyid: Some(self.keys.current_keyid().to_string()),
            salt: salt.to_vec(),
            raw_hash: raw_hash.to_vec(),
        };
        Ok(record.encode())
    }

    /// Check `password` against an encoded password.
    ///
    /// Returns `Ok(false)` for a wrong password; errors are reserved for
    /// records we refuse or fail to process.
    ///
    /// # Errors
    ///
    /// - `PepperError::MalformedEncoding` if `encoded` is oversized or not a
    ///   valid record
    /// - `PepperError::ThresholdExceeded` if its costs are far above ours
    /// - `PepperError::MissingKey` if it was boiled with a key we don't hold
    /// - `PepperError::Operational` on memory or thread exhaustion
    pub fn verify<'a>(&self, password: impl Into<Password<'a>>, encoded: &str) -> Result<bool> {
        // Length is guarded inside parse, before the grammar is looked at
        let record = EncodedRecord::parse(encoded).map_err(|e| {
            log::warn!("Refusing to verify against a malformed encoded password");
            e
        })?;
        check_threshold(&record, &self.config)?;
        log::debug!(
            "Verifying against v={} m={} t={} p={}",
            record.version,
            record.memory_cost,
            record.time_cost,
            record.parallelism
        );

        let secret = match record.keyid.as_deref() {
            Some(keyid) => Some(self.keys.secret(keyid).ok_or_else(|| {
                log::warn!("Encoded password uses keyid {} which is not in the key ring", keyid);
                PepperError::MissingKey(keyid.to_string())
            })?),
            None => None,
        };

        let password = password.into().to_bytes(self.config.encoding)?;
        let ctx = HashContext {
            password: &password,
            salt: &record.salt,
            secret,
            associated_data: &[],
            time_cost: record.time_cost,
            memory_cost: record.memory_cost,
            parallelism: record.parallelism,
            hash_len: record.raw_hash.len(),
            version: record.version,
        };

        match self.primitive.verify(&ctx, &record.raw_hash) {
            Ok(Verification::Match) => Ok(true),
            Ok(Verification::Mismatch) | Err(ErrorCode::VerifyMismatch) => Ok(false),
            Err(code) => Err(classify(code)),
        }
    }

    /// Check whether an encoded password was boiled with weaker parameters
    /// or another key than we use now, and should be re-boiled on next login.
    ///
    /// Not limited by the parameter threshold.
    ///
    /// # Errors
    ///
    /// Returns `PepperError::MalformedEncoding` if `encoded` is not a valid record.
    pub fn needs_update(&self, encoded: &str) -> Result<bool> {
        let record = EncodedRecord::parse(encoded)?;
        Ok(is_stale(&record, &self.config, self.keys.current_keyid()))
    }

    /// Boil once with the full parameter set to surface rejected combinations.
    fn self_check(&self) -> Result<()> {
        self.boil(SELF_CHECK_PASSWORD)?;
        log::debug!(
            "Self-check passed (t={}, m={}, p={}, hash_len={}, salt_len={}, keyid={})",
            self.config.time_cost,
            self.config.memory_cost,
            self.config.parallelism,
            self.config.hash_len,
            self.config.salt_len,
            self.keys.current_keyid()
        );
        Ok(())
    }
}

/// Resource exhaustion is operational; every other rejection is a usage error.
fn classify(code: ErrorCode) -> PepperError {
    if code.is_operational() {
        PepperError::Operational(code.message().to_string())
    } else {
        PepperError::Parameter(code.message().to_string())
    }
}

fn random_salt(len: usize) -> Result<Zeroizing<Vec<u8>>> {
    let mut salt = Zeroizing::new(vec![0u8; len]);
    getrandom::getrandom(&mut salt)
        .map_err(|e| PepperError::Operational(format!("Failed to generate salt: {}", e)))?;
    Ok(salt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Cheap stand-in for Argon2 with scripted failures.
    #[derive(Default)]
    struct Scripted {
        compute_error: Option<ErrorCode>,
        verify_error: Option<ErrorCode>,
        calls: AtomicUsize,
    }

    impl HashPrimitive for Scripted {
        fn compute(
            &self,
            ctx: &HashContext<'_>,
        ) -> std::result::Result<Zeroizing<Vec<u8>>, ErrorCode> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(code) = self.compute_error {
                return Err(code);
            }
            let mut out = vec![0u8; ctx.hash_len];
            let secret = ctx.secret.unwrap_or_default();
            for (i, byte) in out.iter_mut().enumerate() {
                *byte = ctx.salt[i % ctx.salt.len()]
                    ^ ctx.password.get(i).copied().unwrap_or(0)
                    ^ secret.get(i).copied().unwrap_or(0);
            }
            Ok(Zeroizing::new(out))
        }

        fn verify(
            &self,
            ctx: &HashContext<'_>,
            expected: &[u8],
        ) -> std::result::Result<Verification, ErrorCode> {
            if let Some(code) = self.verify_error {
                self.calls.fetch_add(1, Ordering::SeqCst);
                return Err(code);
            }
            let digest = self.compute(ctx)?;
            if digest.as_slice() == expected {
                Ok(Verification::Match)
            } else {
                Ok(Verification::Mismatch)
            }
        }
    }

    fn boiler(primitive: Scripted) -> Result<Boiler<Scripted>> {
        Boiler::with_primitive(
            primitive,
            KeyRing::new([("key1", "secret1")]).unwrap(),
            BoilerConfig {
                time_cost: 1,
                memory_cost: 8,
                parallelism: 1,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_self_check_runs_primitive() {
        let boiler = boiler(Scripted::default()).unwrap();
        assert_eq!(boiler.primitive.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_self_check_memory_allocation_is_operational() {
        let err = boiler(Scripted {
            compute_error: Some(ErrorCode::MemoryAllocationError),
            ..Default::default()
        })
        .unwrap_err();
        assert!(err.is_operational());
        assert_eq!(err.to_string(), "Memory allocation error");
    }

    #[test]
    fn test_self_check_thread_failure_is_operational() {
        let err = boiler(Scripted {
            compute_error: Some(ErrorCode::ThreadFail),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, PepperError::Operational(ref m) if m == "Threading failure"));
    }

    #[test]
    fn test_self_check_rejection_is_parameter_error() {
        let err = boiler(Scripted {
            compute_error: Some(ErrorCode::MemoryTooLittle),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, PepperError::Parameter(ref m) if m == "Memory cost is too small"));
    }

    #[test]
    fn test_threshold_below_one_fails_before_self_check() {
        let result = Boiler::with_primitive(
            Scripted::default(),
            KeyRing::new([("key1", "secret1")]).unwrap(),
            BoilerConfig {
                parameter_threshold: 0,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(PepperError::Parameter(_))));
    }

    #[test]
    fn test_boil_and_verify_with_double() {
        let boiler = boiler(Scripted::default()).unwrap();
        let encoded = boiler.boil("password").unwrap();
        assert!(encoded.starts_with("$argon2i$v=19$m=8,t=1,p=1,keyid=key1$"));
        assert!(boiler.verify("password", &encoded).unwrap());
        assert!(!boiler.verify("wrong", &encoded).unwrap());
    }

    #[test]
    fn test_salt_length_follows_config() {
        let boiler = boiler(Scripted::default()).unwrap();
        let record = EncodedRecord::parse(&boiler.boil("password").unwrap()).unwrap();
        assert_eq!(record.salt.len(), 16);
        assert_eq!(record.raw_hash.len(), 32);
    }

    #[test]
    fn test_verify_operational_errors() {
        for code in [ErrorCode::MemoryAllocationError, ErrorCode::ThreadFail] {
            let boiler = boiler(Scripted {
                verify_error: Some(code),
                ..Default::default()
            })
            .unwrap();
            let encoded = boiler.boil("password").unwrap();
            let err = boiler.verify("password", &encoded).unwrap_err();
            assert!(err.is_operational());
            assert_eq!(err.to_string(), code.message());
        }
    }

    #[test]
    fn test_verify_other_errors_are_usage() {
        let boiler = boiler(Scripted {
            verify_error: Some(ErrorCode::DecodingFail),
            ..Default::default()
        })
        .unwrap();
        let encoded = boiler.boil("password").unwrap();
        let err = boiler.verify("password", &encoded).unwrap_err();
        assert!(matches!(err, PepperError::Parameter(ref m) if m == "Decoding failed"));
    }

    #[test]
    fn test_verify_mismatch_code_is_false() {
        let boiler = boiler(Scripted {
            verify_error: Some(ErrorCode::VerifyMismatch),
            ..Default::default()
        })
        .unwrap();
        let encoded = boiler.boil("password").unwrap();
        assert!(!boiler.verify("password", &encoded).unwrap());
    }

    #[test]
    fn test_malformed_never_reaches_primitive() {
        let boiler = boiler(Scripted::default()).unwrap();
        let before = boiler.primitive.calls.load(Ordering::SeqCst);

        let oversized = "a".repeat(266);
        for encoded in ["definitely not a valid", oversized.as_str()] {
            let err = boiler.verify("password", encoded).unwrap_err();
            assert!(matches!(err, PepperError::MalformedEncoding(_)));
        }
        assert_eq!(boiler.primitive.calls.load(Ordering::SeqCst), before);
    }

    #[test]
    fn test_threshold_never_reaches_primitive() {
        let boiler = boiler(Scripted::default()).unwrap();
        let before = boiler.primitive.calls.load(Ordering::SeqCst);

        let encoded = "$argon2i$v=19$m=8,t=5,p=1,keyid=key1$AhkxHIhp4o4KOuYBCbduUg$vXvsYVvrrzRdOMpVLXgs4w";
        let err = boiler.verify("password", encoded).unwrap_err();
        assert!(matches!(err, PepperError::ThresholdExceeded { parameter: "time_cost", .. }));
        assert_eq!(boiler.primitive.calls.load(Ordering::SeqCst), before);
    }

    #[test]
    fn test_missing_key_never_reaches_primitive() {
        let boiler = boiler(Scripted::default()).unwrap();
        let before = boiler.primitive.calls.load(Ordering::SeqCst);

        let encoded = "$argon2i$v=19$m=8,t=1,p=1,keyid=other$AhkxHIhp4o4KOuYBCbduUg$vXvsYVvrrzRdOMpVLXgs4w";
        let err = boiler.verify("password", encoded).unwrap_err();
        assert!(matches!(err, PepperError::MissingKey(ref id) if id == "other"));
        assert_eq!(boiler.primitive.calls.load(Ordering::SeqCst), before);
    }

    #[test]
    fn test_verify_uses_record_hash_length() {
        let boiler = boiler(Scripted::default()).unwrap();
        let encoded = boiler.boil("password").unwrap();
        let mut record = EncodedRecord::parse(&encoded).unwrap();
        record.raw_hash.truncate(16);
        assert!(boiler.verify("password", &record.encode()).unwrap());
    }
}
