//! Hash primitive boundary.
//!
//! The memory-hard hash itself is an external collaborator. Everything the
//! rest of the crate needs from it goes through [`HashPrimitive`]: one call to
//! compute a digest and one to verify a password against a stored digest.
//! Failures are reported with the closed [`ErrorCode`] set used by the
//! reference Argon2 library, so callers can classify them without knowing
//! which implementation produced them.
//!
//! The default implementation is [`Argon2i`]. Tests swap in doubles to
//! drive error paths without allocating large memory arenas.

pub mod argon2i;

use std::fmt;

use zeroize::Zeroizing;

pub use self::argon2i::Argon2i;

/// Version 0x10 of the Argon2 algorithm (legacy records without `v=`).
pub const ARGON2_VERSION_10: u32 = 0x10;

/// Version 0x13 of the Argon2 algorithm, the latest known.
pub const ARGON2_VERSION_13: u32 = 0x13;

/// The version new records are boiled with.
pub const ARGON2_VERSION_NUMBER: u32 = ARGON2_VERSION_13;

/// Per-call input to the primitive.
///
/// Borrows every buffer from the caller; the caller owns clearing them.
#[derive(Clone, Copy)]
pub struct HashContext<'a> {
    pub password: &'a [u8],
    pub salt: &'a [u8],
    /// Server-side secret, `None` for unkeyed records.
    pub secret: Option<&'a [u8]>,
    pub associated_data: &'a [u8],
    pub time_cost: u32,
    /// Memory cost in KiB.
    pub memory_cost: u32,
    pub parallelism: u32,
    /// Digest length in bytes.
    pub hash_len: usize,
    pub version: u32,
}

impl fmt::Debug for HashContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashContext")
            .field("password", &"[REDACTED]")
            .field("salt_len", &self.salt.len())
            .field("secret", &self.secret.map(|_| "[REDACTED]"))
            .field("associated_data_len", &self.associated_data.len())
            .field("time_cost", &self.time_cost)
            .field("memory_cost", &self.memory_cost)
            .field("parallelism", &self.parallelism)
            .field("hash_len", &self.hash_len)
            .field("version", &self.version)
            .finish()
    }
}

/// Outcome of a completed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Match,
    Mismatch,
}

/// A memory-hard hash function.
///
/// Implementations must be safe to share between threads; every call is
/// independent and must not keep any per-call state.
pub trait HashPrimitive: Send + Sync {
    /// Compute a `ctx.hash_len`-byte digest.
    fn compute(&self, ctx: &HashContext<'_>) -> std::result::Result<Zeroizing<Vec<u8>>, ErrorCode>;

    /// Verify `expected` against the digest of `ctx`.
    ///
    /// The default recomputes the digest and compares in constant time.
    fn verify(
        &self,
        ctx: &HashContext<'_>,
        expected: &[u8],
    ) -> std::result::Result<Verification, ErrorCode> {
        let digest = self.compute(ctx)?;
        if constant_time_eq(&digest, expected) {
            Ok(Verification::Match)
        } else {
            Ok(Verification::Mismatch)
        }
    }
}

impl<P: HashPrimitive + ?Sized> HashPrimitive for Box<P> {
    fn compute(&self, ctx: &HashContext<'_>) -> std::result::Result<Zeroizing<Vec<u8>>, ErrorCode> {
        (**self).compute(ctx)
    }

    fn verify(
        &self,
        ctx: &HashContext<'_>,
        expected: &[u8],
    ) -> std::result::Result<Verification, ErrorCode> {
        (**self).verify(ctx, expected)
    }
}

/// Compare two byte strings without early exit on the first difference.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Failure codes of the reference Argon2 library.
///
/// Success is not a member; it is the `Ok` side of each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    OutputPtrNull = -1,
    OutputTooShort = -2,
    OutputTooLong = -3,
    PwdTooShort = -4,
    PwdTooLong = -5,
    SaltTooShort = -6,
    SaltTooLong = -7,
    AdTooShort = -8,
    AdTooLong = -9,
    SecretTooShort = -10,
    SecretTooLong = -11,
    TimeTooSmall = -12,
    TimeTooLarge = -13,
    MemoryTooLittle = -14,
    MemoryTooMuch = -15,
    LanesTooFew = -16,
    LanesTooMany = -17,
    PwdPtrMismatch = -18,
    SaltPtrMismatch = -19,
    SecretPtrMismatch = -20,
    AdPtrMismatch = -21,
    MemoryAllocationError = -22,
    FreeMemoryCbkNull = -23,
    AllocateMemoryCbkNull = -24,
    IncorrectParameter = -25,
    IncorrectType = -26,
    OutPtrMismatch = -27,
    ThreadsTooFew = -28,
    ThreadsTooMany = -29,
    MissingArgs = -30,
    EncodingFail = -31,
    DecodingFail = -32,
    ThreadFail = -33,
    DecodingLengthFail = -34,
    VerifyMismatch = -35,
}

impl ErrorCode {
    const ALL: [ErrorCode; 35] = [
        ErrorCode::OutputPtrNull,
        ErrorCode::OutputTooShort,
        ErrorCode::OutputTooLong,
        ErrorCode::PwdTooShort,
        ErrorCode::PwdTooLong,
        ErrorCode::SaltTooShort,
        ErrorCode::SaltTooLong,
        ErrorCode::AdTooShort,
        ErrorCode::AdTooLong,
        ErrorCode::SecretTooShort,
        ErrorCode::SecretTooLong,
        ErrorCode::TimeTooSmall,
        ErrorCode::TimeTooLarge,
        ErrorCode::MemoryTooLittle,
        ErrorCode::MemoryTooMuch,
        ErrorCode::LanesTooFew,
        ErrorCode::LanesTooMany,
        ErrorCode::PwdPtrMismatch,
        ErrorCode::SaltPtrMismatch,
        ErrorCode::SecretPtrMismatch,
        ErrorCode::AdPtrMismatch,
        ErrorCode::MemoryAllocationError,
        ErrorCode::FreeMemoryCbkNull,
        ErrorCode::AllocateMemoryCbkNull,
        ErrorCode::IncorrectParameter,
        ErrorCode::IncorrectType,
        ErrorCode::OutPtrMismatch,
        ErrorCode::ThreadsTooFew,
        ErrorCode::ThreadsTooMany,
        ErrorCode::MissingArgs,
        ErrorCode::EncodingFail,
        ErrorCode::DecodingFail,
        ErrorCode::ThreadFail,
        ErrorCode::DecodingLengthFail,
        ErrorCode::VerifyMismatch,
    ];

    /// Map a raw library return code. `0` (success) and unknown values give `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// The raw library return code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Resource exhaustion rather than a rejected input.
    pub fn is_operational(self) -> bool {
        matches!(self, ErrorCode::MemoryAllocationError | ErrorCode::ThreadFail)
    }

    /// The reference library's message for this code.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::OutputPtrNull => "Output pointer is NULL",
            ErrorCode::OutputTooShort => "Output is too short",
            ErrorCode::OutputTooLong => "Output is too long",
            ErrorCode::PwdTooShort => "Password is too short",
            ErrorCode::PwdTooLong => "Password is too long",
            ErrorCode::SaltTooShort => "Salt is too short",
            ErrorCode::SaltTooLong => "Salt is too long",
            ErrorCode::AdTooShort => "Associated data is too short",
            ErrorCode::AdTooLong => "Associated data is too long",
            ErrorCode::SecretTooShort => "Secret is too short",
            ErrorCode::SecretTooLong => "Secret is too long",
            ErrorCode::TimeTooSmall => "Time cost is too small",
            ErrorCode::TimeTooLarge => "Time cost is too large",
            ErrorCode::MemoryTooLittle => "Memory cost is too small",
            ErrorCode::MemoryTooMuch => "Memory cost is too large",
            ErrorCode::LanesTooFew => "Too few lanes",
            ErrorCode::LanesTooMany => "Too many lanes",
            ErrorCode::PwdPtrMismatch => "Password pointer is NULL, but password length is not 0",
            ErrorCode::SaltPtrMismatch => "Salt pointer is NULL, but salt length is not 0",
            ErrorCode::SecretPtrMismatch => "Secret pointer is NULL, but secret length is not 0",
            ErrorCode::AdPtrMismatch => {
                "Associated data pointer is NULL, but ad length is not 0"
            }
            ErrorCode::MemoryAllocationError => "Memory allocation error",
            ErrorCode::FreeMemoryCbkNull => "The free memory callback is NULL",
            ErrorCode::AllocateMemoryCbkNull => "The allocate memory callback is NULL",
            ErrorCode::IncorrectParameter => "Argon2_Context context is NULL",
            ErrorCode::IncorrectType => "There is no such version of Argon2",
            ErrorCode::OutPtrMismatch => "Output pointer mismatch",
            ErrorCode::ThreadsTooFew => "Not enough threads",
            ErrorCode::ThreadsTooMany => "Too many threads",
            ErrorCode::MissingArgs => "Missing arguments",
            ErrorCode::EncodingFail => "Encoding failed",
            ErrorCode::DecodingFail => "Decoding failed",
            ErrorCode::ThreadFail => "Threading failure",
            ErrorCode::DecodingLengthFail => {
                "Some of encoded parameters are too long or too short"
            }
            ErrorCode::VerifyMismatch => "The password does not match the supplied hash",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
