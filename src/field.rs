//! Field arithmetic boundary
//!
//! Everything that crosses between arbitrary-precision integers, signed
//! feature coordinates, decimal wire strings, or raw digest bytes and the
//! scalar field `F` goes through this module. The rest of the crate consumes
//! field elements only.
//!
//! Conversions are deterministic and constant-width. Inputs wider than the
//! modulus are **reduced** mod `p`, never truncated — the 32-byte Argon2
//! digest in particular enters the field through [`field_from_bytes`].

use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;

use crate::{F, FIELD_BYTES};

/// Errors produced at the integer/field boundary.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// The wire string was not a base-10 integer.
    #[error("`{0}` is not a decimal integer")]
    BadNumeral(String),
}

/// Lift a signed coordinate into the field. Negative values wrap to `p + x`.
pub fn lift_i64(x: i64) -> F {
    if x >= 0 {
        F::from(x as u64)
    } else {
        -F::from(x.unsigned_abs())
    }
}

/// Parse a decimal integer string into a field element, reducing mod `p`.
pub fn from_decimal(s: &str) -> Result<F, FieldError> {
    let digits = s.trim();
    if digits.is_empty() {
        return Err(FieldError::BadNumeral(s.to_string()));
    }
    let n = BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| FieldError::BadNumeral(s.to_string()))?;
    Ok(F::from_be_bytes_mod_order(&n.to_bytes_be()))
}

/// [`from_decimal`], except an empty (or all-whitespace) string parses to
/// zero. This is the challenge-default rule: an absent session nonce binds
/// the proof to the zero challenge.
pub fn from_decimal_or_zero(s: &str) -> Result<F, FieldError> {
    if s.trim().is_empty() {
        return Ok(F::from(0u64));
    }
    from_decimal(s)
}

/// Render a field element as the decimal string of its canonical
/// representative in `[0, p)`.
pub fn to_decimal(x: &F) -> String {
    BigUint::from_bytes_be(&field_bytes(x)).to_string()
}

/// Canonical fixed-width big-endian encoding of a field element.
pub fn field_bytes(x: &F) -> [u8; FIELD_BYTES] {
    let raw = x.into_bigint().to_bytes_be();
    let mut out = [0u8; FIELD_BYTES];
    out[FIELD_BYTES - raw.len()..].copy_from_slice(&raw);
    out
}

/// Interpret big-endian bytes as an integer and reduce it into the field.
///
/// Accepts any width; values at or above `p` reduce. This is the required
/// ingestion path for the 32-byte Argon2 output.
pub fn field_from_bytes(bytes: &[u8]) -> F {
    F::from_be_bytes_mod_order(bytes)
}

/// The canonical representative of a field element as a big integer.
pub fn from_field(x: &F) -> BigUint {
    BigUint::from_bytes_be(&field_bytes(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;

    #[test]
    fn negative_coordinates_wrap() {
        assert_eq!(lift_i64(-7), -F::from(7u64));
        assert_eq!(lift_i64(-7) + F::from(7u64), F::from(0u64));
        assert_eq!(lift_i64(42), F::from(42u64));
        assert_eq!(lift_i64(i64::MIN), -F::from(i64::MIN.unsigned_abs()));
    }

    #[test]
    fn decimal_round_trip() {
        let mut rng = ark_std::test_rng();
        for _ in 0..32 {
            let x = F::rand(&mut rng);
            let parsed = from_decimal(&to_decimal(&x)).unwrap();
            assert_eq!(parsed, x);
        }
    }

    #[test]
    fn decimal_rejects_garbage() {
        assert!(from_decimal("").is_err());
        assert!(from_decimal("12x34").is_err());
        assert!(from_decimal("-5").is_err());
    }

    #[test]
    fn empty_challenge_is_zero() {
        assert_eq!(from_decimal_or_zero("").unwrap(), F::from(0u64));
        assert_eq!(from_decimal_or_zero("  ").unwrap(), F::from(0u64));
        assert_eq!(from_decimal_or_zero("99999").unwrap(), F::from(99999u64));
    }

    #[test]
    fn byte_encoding_is_fixed_width() {
        let one = field_bytes(&F::from(1u64));
        assert_eq!(one.len(), FIELD_BYTES);
        assert_eq!(one[FIELD_BYTES - 1], 1);
        assert!(one[..FIELD_BYTES - 1].iter().all(|&b| b == 0));

        let mut rng = ark_std::test_rng();
        let x = F::rand(&mut rng);
        assert_eq!(field_from_bytes(&field_bytes(&x)), x);
    }

    #[test]
    fn over_width_input_reduces() {
        // p + 5 must land on 5, not be truncated.
        let p = F::MODULUS;
        let mut n = BigUint::from_bytes_be(&p.to_bytes_be());
        n += 5u32;
        assert_eq!(field_from_bytes(&n.to_bytes_be()), F::from(5u64));
        assert_eq!(from_decimal(&n.to_string()).unwrap(), F::from(5u64));
    }
}
