//! The authentication circuit
//!
//! Arithmetic predicate over the witness, three blocks in order:
//!
//! 1. **Commitment integrity** — the in-circuit sponge absorbs
//!    `original[0..N], password, salt` and the digest must equal the public
//!    commitment.
//! 2. **Nonce binding** — sponge reset, absorbs `commitment, challenge`, and
//!    the digest must equal the public bound challenge.
//! 3. **Fuzzy distance** — for every coordinate, `(original − current)²`
//!    must not exceed `T²`.
//!
//! The fuzzy comparison runs on [`FpVar::enforce_cmp`], which bit-decomposes
//! the squared difference and compares its **natural-number** representative.
//! Field subtraction is modular, so a malicious `current[i]` can make the
//! difference wrap to a huge residue; the decomposition-based comparator
//! rejects any square that exceeds `T²` as an integer, which forecloses the
//! wrap. A naive field-level comparison would not.
//!
//! Public inputs are allocated in the fixed order `commitment`, `challenge`,
//! `bound_challenge`; [`AuthWitness::public_inputs`] mirrors that order for
//! verify-time reconstruction.

use core::cmp::Ordering;

use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::{mimc, F, FEATURE_LEN, MATCH_THRESHOLD};

/// In-circuit MiMC sponge, the gadget twin of [`mimc::Mimc`].
///
/// Same permutation, same Miyaguchi–Preneel absorption, same round-constant
/// table; the two produce identical digests for identical absorb schedules.
pub struct MimcVar {
    state: FpVar<F>,
}

impl MimcVar {
    /// Fresh sponge with zero state.
    pub fn new() -> Self {
        Self {
            state: FpVar::Constant(F::from(0u64)),
        }
    }

    /// Re-initialize the sponge state.
    pub fn reset(&mut self) {
        self.state = FpVar::Constant(F::from(0u64));
    }

    /// Absorb one circuit variable: `state ← E_state(x) + state + x`.
    pub fn absorb(&mut self, x: &FpVar<F>) -> Result<(), SynthesisError> {
        let enc = Self::encrypt(&self.state, x)?;
        self.state = &self.state + &enc + x;
        Ok(())
    }

    /// Current digest.
    pub fn sum(&self) -> FpVar<F> {
        self.state.clone()
    }

    /// The keyed permutation `E_h(x)`: `x ← (x + h + c_i)^5` per round.
    fn encrypt(h: &FpVar<F>, x: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
        let mut x = x.clone();
        for c in mimc::round_constants() {
            let t = &x + h + *c;
            let t2 = t.square()?;
            x = t2.square()? * &t;
        }
        Ok(x)
    }
}

impl Default for MimcVar {
    fn default() -> Self {
        Self::new()
    }
}

/// Full assignment to the circuit, public slice separately addressable.
#[derive(Debug, Clone)]
pub struct AuthWitness {
    /// Enrolled feature coordinates (private).
    pub original: Vec<F>,
    /// Freshly presented candidate coordinates (private).
    pub current: Vec<F>,
    /// Stretched password field element (private).
    pub password: F,
    /// Salt field element (private).
    pub salt: F,
    /// Enrollment commitment (public).
    pub commitment: F,
    /// Verifier session nonce (public).
    pub challenge: F,
    /// Bound challenge `H(commitment, challenge)` (public).
    pub bound_challenge: F,
}

impl AuthWitness {
    /// The public input slice in circuit allocation order.
    pub fn public_inputs(&self) -> Vec<F> {
        vec![self.commitment, self.challenge, self.bound_challenge]
    }
}

/// The authentication predicate as a constraint synthesizer.
///
/// Assignments are `Option`-valued: [`AuthCircuit::blank`] carries `None`
/// everywhere and is used for setup, where values are never queried; proving
/// uses a fully assigned instance built from an [`AuthWitness`].
#[derive(Clone)]
pub struct AuthCircuit {
    original: Vec<Option<F>>,
    current: Vec<Option<F>>,
    password: Option<F>,
    salt: Option<F>,
    commitment: Option<F>,
    challenge: Option<F>,
    bound_challenge: Option<F>,
}

impl AuthCircuit {
    /// Unassigned circuit of the fixed feature length, for key generation.
    pub fn blank() -> Self {
        Self {
            original: vec![None; FEATURE_LEN],
            current: vec![None; FEATURE_LEN],
            password: None,
            salt: None,
            commitment: None,
            challenge: None,
            bound_challenge: None,
        }
    }
}

impl From<&AuthWitness> for AuthCircuit {
    fn from(w: &AuthWitness) -> Self {
        Self {
            original: w.original.iter().copied().map(Some).collect(),
            current: w.current.iter().copied().map(Some).collect(),
            password: Some(w.password),
            salt: Some(w.salt),
            commitment: Some(w.commitment),
            challenge: Some(w.challenge),
            bound_challenge: Some(w.bound_challenge),
        }
    }
}

fn alloc_private(
    cs: ConstraintSystemRef<F>,
    vals: &[Option<F>],
) -> Result<Vec<FpVar<F>>, SynthesisError> {
    vals.iter()
        .map(|v| {
            FpVar::new_witness(cs.clone(), || v.ok_or(SynthesisError::AssignmentMissing))
        })
        .collect()
}

impl ConstraintSynthesizer<F> for AuthCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        assert_eq!(self.original.len(), FEATURE_LEN);
        assert_eq!(self.current.len(), FEATURE_LEN);

        // Public inputs; allocation order fixes the verify-time layout.
        let commitment = FpVar::new_input(cs.clone(), || {
            self.commitment.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let challenge = FpVar::new_input(cs.clone(), || {
            self.challenge.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let bound_challenge = FpVar::new_input(cs.clone(), || {
            self.bound_challenge.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let original = alloc_private(cs.clone(), &self.original)?;
        let current = alloc_private(cs.clone(), &self.current)?;
        let password = FpVar::new_witness(cs.clone(), || {
            self.password.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let salt = FpVar::new_witness(cs.clone(), || {
            self.salt.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // Block 1: commitment integrity.
        let mut sponge = MimcVar::new();
        for f in &original {
            sponge.absorb(f)?;
        }
        sponge.absorb(&password)?;
        sponge.absorb(&salt)?;
        sponge.sum().enforce_equal(&commitment)?;

        // Block 2: nonce binding.
        sponge.reset();
        sponge.absorb(&commitment)?;
        sponge.absorb(&challenge)?;
        sponge.sum().enforce_equal(&bound_challenge)?;

        // Block 3: fuzzy distance, natural-number comparison per coordinate.
        let limit = FpVar::Constant(F::from(MATCH_THRESHOLD * MATCH_THRESHOLD));
        for (o, c) in original.iter().zip(current.iter()) {
            let d = o - c;
            let s = d.square()?;
            s.enforce_cmp(&limit, Ordering::Less, true)?;
        }

        Ok(())
    }
}
