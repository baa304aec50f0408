//! MiMC sponge, off-circuit half
//!
//! MiMC-p/5 over the BN254 scalar field with the Miyaguchi–Preneel
//! compression: absorbing `x` into state `h` computes `h' = E_h(x) + h + x`,
//! where `E_h` is the keyed permutation `x ← (x + h + c_i)^5` iterated over
//! [`MIMC_ROUNDS`] rounds. The digest is the running state.
//!
//! The in-circuit twin lives in [`crate::circuit`] and replays the exact
//! same schedule over `FpVar`s; both halves read the single round-constant
//! table below, so agreement is structural rather than coincidental.
//!
//! ## Round constants
//!
//! Derived once per process from a BLAKE3 XOF under a fixed
//! domain-separation tag, in 64-byte chunks reduced little-endian into the
//! field. Changing the tag changes every digest; it is part of the
//! commitment format.

use ark_ff::{Field, PrimeField};
use std::io::Read;
use std::sync::OnceLock;

use crate::F;

/// Number of permutation rounds. 110 rounds of `x^5` give a comfortable
/// algebraic-degree margin on a ~254-bit field.
pub const MIMC_ROUNDS: usize = 110;

/// Domain-separation tag for the round-constant schedule.
const CONSTANTS_DST: &[u8] = b"biozkp.mimc.bn254.v1";

static ROUND_CONSTANTS: OnceLock<Vec<F>> = OnceLock::new();

/// The process-wide round-constant table, derived on first use.
pub fn round_constants() -> &'static [F] {
    ROUND_CONSTANTS.get_or_init(|| {
        let mut hasher = blake3::Hasher::new();
        hasher.update(CONSTANTS_DST);
        let mut xof = hasher.finalize_xof();
        let mut buf = [0u8; 64];
        let mut out = Vec::with_capacity(MIMC_ROUNDS);
        for _ in 0..MIMC_ROUNDS {
            let _ = xof.read(&mut buf);
            out.push(F::from_le_bytes_mod_order(&buf));
        }
        out
    })
}

/// The keyed MiMC permutation `E_h(x)`.
fn encrypt(h: &F, x: &F) -> F {
    let mut x = *x;
    for c in round_constants() {
        let t = x + h + c;
        let t2 = t.square();
        x = t2.square() * t;
    }
    x
}

/// Sponge-style MiMC absorber over field elements.
///
/// Absorption order is significant. A hasher reused for a second digest
/// behaves as if [`reset`](Mimc::reset) were called in between; callers may
/// equivalently instantiate a fresh hasher.
#[derive(Debug, Clone, Default)]
pub struct Mimc {
    state: F,
}

impl Mimc {
    /// Fresh hasher with zero state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-initialize the sponge state.
    pub fn reset(&mut self) {
        self.state = F::from(0u64);
    }

    /// Absorb one field element.
    pub fn absorb(&mut self, x: &F) {
        let enc = encrypt(&self.state, x);
        self.state += enc + x;
    }

    /// Current digest: a single field element, reduced mod `p`.
    pub fn sum(&self) -> F {
        self.state
    }
}

/// One-shot digest of an input sequence.
pub fn hash(inputs: &[F]) -> F {
    let mut h = Mimc::new();
    for x in inputs {
        h.absorb(x);
    }
    h.sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;

    #[test]
    fn deterministic_and_order_sensitive() {
        let a = F::from(1u64);
        let b = F::from(2u64);
        assert_eq!(hash(&[a, b]), hash(&[a, b]));
        assert_ne!(hash(&[a, b]), hash(&[b, a]));
        assert_ne!(hash(&[a]), hash(&[a, b]));
    }

    #[test]
    fn reset_matches_fresh_hasher() {
        let mut rng = ark_std::test_rng();
        let xs: Vec<F> = (0..8).map(|_| F::rand(&mut rng)).collect();

        let mut reused = Mimc::new();
        for x in &xs[..4] {
            reused.absorb(x);
        }
        let first = reused.sum();
        reused.reset();
        for x in &xs[4..] {
            reused.absorb(x);
        }

        assert_eq!(first, hash(&xs[..4]));
        assert_eq!(reused.sum(), hash(&xs[4..]));
    }

    #[test]
    fn constants_table_is_stable() {
        let cs = round_constants();
        assert_eq!(cs.len(), MIMC_ROUNDS);
        // Two lookups hand out the same table.
        assert_eq!(cs[0], round_constants()[0]);
        // The schedule must not collapse to a repeated constant.
        assert_ne!(cs[0], cs[1]);
    }
}
