//! Policy checks on parsed records.
//!
//! Both checks compare a record against the current [`BoilerConfig`]:
//! [`check_threshold`] refuses records too expensive to process, and
//! [`is_stale`] reports records weaker than what we would boil today.

use crate::config::BoilerConfig;
use crate::encoding::EncodedRecord;
use crate::error::{PepperError, Result};
use crate::primitive::ARGON2_VERSION_NUMBER;

/// Refuse a record whose costs exceed `configured × parameter_threshold`.
///
/// Anyone able to write stored records could otherwise make each
/// verification burn arbitrary CPU and memory. The bound is inclusive.
pub fn check_threshold(record: &EncodedRecord, config: &BoilerConfig) -> Result<()> {
    let threshold = u64::from(config.parameter_threshold);
    let checks = [
        ("time_cost", record.time_cost, config.time_cost),
        ("memory_cost", record.memory_cost, config.memory_cost),
        ("parallelism", record.parallelism, config.parallelism),
    ];

    for (parameter, value, ours) in checks {
        let limit = u64::from(ours) * threshold;
        if u64::from(value) > limit {
            log::warn!(
                "Refusing encoded password: {} {} exceeds limit {}",
                parameter,
                value,
                limit
            );
            return Err(PepperError::ThresholdExceeded {
                parameter,
                value,
                limit,
            });
        }
    }
    Ok(())
}

/// True if `record` should be re-boiled under the current policy.
pub fn is_stale(record: &EncodedRecord, config: &BoilerConfig, current_keyid: &str) -> bool {
    record.version < ARGON2_VERSION_NUMBER
        || record.parallelism < config.parallelism
        || record.memory_cost < config.memory_cost
        || record.time_cost < config.time_cost
        || record.salt.len() < config.salt_len
        || record.raw_hash.len() < config.hash_len
        || record.keyid.as_deref() != Some(current_keyid)
}
