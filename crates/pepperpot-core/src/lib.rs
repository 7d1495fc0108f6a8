//! # Pepperpot Core
//!
//! Keyed password hashing with sensible defaults and server-side secrets.
//!
//! Passwords are boiled with Argon2i plus a server-side secret (a "pepper")
//! into a self-describing encoded string that is safe to store. Verification
//! reads its parameters back from that string, so stored passwords keep
//! working while the defaults move on.
//!
//! ## Architecture
//!
//! - **boiler**: boil, verify and needs_update; error classification
//! - **config**: cost and encoding options
//! - **keys**: the key ring, current key first, for secret rotation
//! - **encoding**: the encoded password format
//! - **policy**: parameter threshold and staleness checks
//! - **primitive**: the hash primitive boundary and the Argon2i adapter
//! - **password**: text and byte password input
//!
//! ## Errors
//!
//! Operational errors (memory or thread exhaustion) may be retried. Everything
//! else is a usage error and should be loud. A wrong password is not an
//! error: `verify` returns `Ok(false)`.

pub mod boiler;
pub mod config;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod password;
pub mod policy;
pub mod primitive;

pub use boiler::Boiler;
pub use config::{BoilerConfig, TextEncoding};
pub use encoding::{EncodedRecord, MAX_ENCODED_LEN};
pub use error::{ErrorKind, PepperError, Result};
pub use keys::KeyRing;
pub use password::Password;
pub use primitive::{Argon2i, ErrorCode, HashContext, HashPrimitive, Verification};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
