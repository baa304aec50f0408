//! Password stretching
//!
//! Argon2id derivation from `(password, salt)` to a field element. The
//! memory-hard stretch keeps the password resistant to offline brute force
//! even if a commitment leaks; the resulting field element flows into the
//! in-circuit commitment hash, binding every proof to password knowledge.
//!
//! The salt enters Argon2 as the **string form presented on the wire**, not
//! its decimal-parsed integer value — the circuit's `salt` input is the
//! parsed integer and the two roles are deliberately distinct (see
//! DESIGN.md). The RustCrypto crate requires at least 8 salt bytes, so
//! shorter presented salts are zero-padded up to that minimum; the padding
//! is part of the commitment format.

use argon2::{Algorithm, Argon2, Params, Version};

use crate::{field, F};

/// Argon2id memory cost, KiB (64 MiB per derivation).
pub const STRETCH_M_COST: u32 = 64 * 1024;
/// Argon2id time cost (passes).
pub const STRETCH_T_COST: u32 = 1;
/// Argon2id lane count.
pub const STRETCH_P_COST: u32 = 4;
/// Digest width fed into the field reduction.
pub const STRETCH_OUT_LEN: usize = 32;

/// Errors from the password stretcher.
#[derive(Debug, thiserror::Error)]
pub enum StretchError {
    /// Parameter construction or hashing failed inside Argon2.
    #[error("argon2id stretch failed: {0}")]
    Argon2(#[from] argon2::Error),
}

/// Stretch `(password, salt)` into a field element.
///
/// The 32-byte Argon2id output is read as a big-endian integer and reduced
/// mod `p`. Deterministic for fixed inputs and parameters.
pub fn stretch_password(password: &str, salt: &str) -> Result<F, StretchError> {
    let params = Params::new(
        STRETCH_M_COST,
        STRETCH_T_COST,
        STRETCH_P_COST,
        Some(STRETCH_OUT_LEN),
    )?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut salt_bytes = salt.as_bytes().to_vec();
    if salt_bytes.len() < argon2::MIN_SALT_LEN {
        salt_bytes.resize(argon2::MIN_SALT_LEN, 0);
    }

    let mut out = [0u8; STRETCH_OUT_LEN];
    argon.hash_password_into(password.as_bytes(), &salt_bytes, &mut out)?;
    Ok(field::field_from_bytes(&out))
}
