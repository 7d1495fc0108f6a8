//! Argon2i via the RustCrypto `argon2` crate.
//!
//! Lanes are processed on the calling thread, so this adapter never reports
//! [`ErrorCode::ThreadFail`]. Working memory is reserved with a fallible
//! allocation: a cost the machine cannot satisfy comes back as
//! [`ErrorCode::MemoryAllocationError`] instead of aborting the process, and
//! is zeroized when the call returns, whether it succeeded or not.

use argon2::{Algorithm, Argon2, AssociatedData, Block, ParamsBuilder, Version};
use zeroize::Zeroizing;

use super::{ErrorCode, HashContext, HashPrimitive};

/// The Argon2i hash primitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2i;

impl HashPrimitive for Argon2i {
    fn compute(&self, ctx: &HashContext<'_>) -> Result<Zeroizing<Vec<u8>>, ErrorCode> {
        let version = Version::try_from(ctx.version).map_err(|_| ErrorCode::IncorrectType)?;

        let mut builder = ParamsBuilder::new();
        builder
            .m_cost(ctx.memory_cost)
            .t_cost(ctx.time_cost)
            .p_cost(ctx.parallelism)
            .output_len(ctx.hash_len);
        if !ctx.associated_data.is_empty() {
            builder.data(AssociatedData::new(ctx.associated_data).map_err(error_code)?);
        }
        let params = builder.build().map_err(error_code)?;
        let block_count = params.block_count();

        let hasher = match ctx.secret {
            Some(secret) => Argon2::new_with_secret(secret, Algorithm::Argon2i, version, params)
                .map_err(error_code)?,
            None => Argon2::new(Algorithm::Argon2i, version, params),
        };

        let mut memory = allocate_blocks(block_count)?;
        let mut out = Zeroizing::new(vec![0u8; ctx.hash_len]);
        hasher
            .hash_password_into_with_memory(ctx.password, ctx.salt, &mut out[..], &mut memory[..])
            .map_err(error_code)?;

        Ok(out)
    }
}

/// Reserve the Argon2 working memory without aborting on exhaustion.
///
/// The blocks are derived from the password and secret, so they are cleared
/// on drop.
fn allocate_blocks(count: usize) -> Result<Zeroizing<Vec<Block>>, ErrorCode> {
    let mut blocks = Vec::new();
    blocks
        .try_reserve_exact(count)
        .map_err(|_| ErrorCode::MemoryAllocationError)?;
    blocks.resize(count, Block::default());
    Ok(Zeroizing::new(blocks))
}

fn error_code(err: argon2::Error) -> ErrorCode {
    match err {
        argon2::Error::AdTooLong => ErrorCode::AdTooLong,
        argon2::Error::MemoryTooLittle => ErrorCode::MemoryTooLittle,
        argon2::Error::MemoryTooMuch => ErrorCode::MemoryTooMuch,
        argon2::Error::OutputTooShort => ErrorCode::OutputTooShort,
        argon2::Error::OutputTooLong => ErrorCode::OutputTooLong,
        argon2::Error::PwdTooLong => ErrorCode::PwdTooLong,
        argon2::Error::SaltTooShort => ErrorCode::SaltTooShort,
        argon2::Error::SaltTooLong => ErrorCode::SaltTooLong,
        argon2::Error::SecretTooLong => ErrorCode::SecretTooLong,
        argon2::Error::ThreadsTooFew => ErrorCode::ThreadsTooFew,
        argon2::Error::ThreadsTooMany => ErrorCode::ThreadsTooMany,
        argon2::Error::TimeTooSmall => ErrorCode::TimeTooSmall,
        argon2::Error::AlgorithmInvalid | argon2::Error::VersionInvalid => {
            ErrorCode::IncorrectType
        }
        _ => ErrorCode::IncorrectParameter,
    }
}
