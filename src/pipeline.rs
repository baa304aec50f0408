//! Prover and verifier pipelines
//!
//! [`Prover`] turns a typed authentication attempt into a Groth16 proof:
//! feature lifting, salt/challenge parsing, password stretching, off-circuit
//! commitment and bound-challenge computation, witness assembly, a
//! satisfiability gate, then proving. [`Verifier`] reconstructs the
//! public-only input slice from **trusted server-side values** — the bound
//! challenge is always recomputed, never accepted from the client — and runs
//! Groth16 verification against the processed key.
//!
//! Both sides borrow the process-wide immutable [`AuthKeys`]; everything
//! else is request-local.
//!
//! A cryptographic mismatch at verify time is `Ok(false)`, not an error:
//! rejection is an expected operational outcome. On the prove side an
//! assignment that fails the predicate surfaces as the dedicated
//! [`ProveError::Unsatisfied`] so the HTTP layer can distinguish it (403)
//! from synthesis faults (500).

use ark_groth16::{Groth16, Proof};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, SynthesisError};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};

use crate::circuit::{AuthCircuit, AuthWitness};
use crate::field::{self, FieldError};
use crate::mimc::Mimc;
use crate::setup::AuthKeys;
use crate::stretch::{self, StretchError};
use crate::{Curve, F, FEATURE_LEN};

/// A typed prove request, after JSON decoding and before field lifting.
#[derive(Debug, Clone)]
pub struct AuthAttempt {
    /// Enrolled feature coordinates, exactly [`FEATURE_LEN`] of them.
    pub secret: Vec<i64>,
    /// Candidate coordinates; equal to `secret` when re-proving enrollment.
    pub candidate: Vec<i64>,
    /// Plaintext password.
    pub password: String,
    /// Salt, as the decimal string presented on the wire. Feeds Argon2 in
    /// string form and the circuit in parsed-integer form.
    pub salt: String,
    /// Session nonce as a decimal string; empty means zero.
    pub challenge: String,
}

/// A finished proof with its public context.
#[derive(Debug, Clone)]
pub struct AuthProof {
    /// The Groth16 proof.
    pub proof: Proof<Curve>,
    /// Public inputs in circuit order: commitment, challenge, bound challenge.
    pub public_inputs: Vec<F>,
    /// The commitment, also carried separately for enrollment flows.
    pub commitment: F,
}

/// Errors from the prover pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ProveError {
    /// A feature vector had the wrong length.
    #[error("feature vector must have {expected} coordinates (got {got})")]
    BadShape {
        /// Required coordinate count.
        expected: usize,
        /// Count actually supplied.
        got: usize,
    },
    /// Salt or challenge was not a decimal numeral.
    #[error(transparent)]
    Numeral(#[from] FieldError),
    /// Password stretching failed.
    #[error(transparent)]
    Stretch(#[from] StretchError),
    /// The assignment does not satisfy the authentication predicate
    /// (candidate out of tolerance, or inconsistent commitment inputs).
    #[error("witness does not satisfy the authentication predicate")]
    Unsatisfied,
    /// Constraint synthesis or proving failed.
    #[error("constraint synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// Errors from the verifier pipeline.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The pairing backend failed; distinct from an invalid proof.
    #[error("verification backend failed: {0}")]
    Backend(#[from] SynthesisError),
}

/// Assemble the full witness for an attempt: lift, parse, stretch, and
/// compute the commitment and bound challenge off-circuit.
pub fn assemble_witness(attempt: &AuthAttempt) -> Result<AuthWitness, ProveError> {
    if attempt.secret.len() != FEATURE_LEN {
        return Err(ProveError::BadShape {
            expected: FEATURE_LEN,
            got: attempt.secret.len(),
        });
    }
    if attempt.candidate.len() != FEATURE_LEN {
        return Err(ProveError::BadShape {
            expected: FEATURE_LEN,
            got: attempt.candidate.len(),
        });
    }

    let original: Vec<F> = attempt.secret.iter().map(|&x| field::lift_i64(x)).collect();
    let current: Vec<F> = attempt
        .candidate
        .iter()
        .map(|&x| field::lift_i64(x))
        .collect();

    let salt = field::from_decimal(&attempt.salt)?;
    let password = stretch::stretch_password(&attempt.password, &attempt.salt)?;
    let challenge = field::from_decimal_or_zero(&attempt.challenge)?;

    let mut sponge = Mimc::new();
    for f in &original {
        sponge.absorb(f);
    }
    sponge.absorb(&password);
    sponge.absorb(&salt);
    let commitment = sponge.sum();

    sponge.reset();
    sponge.absorb(&commitment);
    sponge.absorb(&challenge);
    let bound_challenge = sponge.sum();

    Ok(AuthWitness {
        original,
        current,
        password,
        salt,
        commitment,
        challenge,
        bound_challenge,
    })
}

/// Prover pipeline over the process-wide keys.
pub struct Prover<'a> {
    /// Immutable key material generated at startup.
    pub keys: &'a AuthKeys,
}

impl Prover<'_> {
    /// Produce a proof for an attempt, or fail with a mapped error.
    ///
    /// The assignment is synthesized once on a throwaway constraint system
    /// and gated on satisfiability before the (expensive) proving run: the
    /// Groth16 prover itself does not reject an unsatisfiable witness, it
    /// would just emit a proof that can never verify.
    pub fn prove<R: RngCore + CryptoRng>(
        &self,
        attempt: &AuthAttempt,
        rng: &mut R,
    ) -> Result<AuthProof, ProveError> {
        let witness = assemble_witness(attempt)?;
        let circuit = AuthCircuit::from(&witness);

        let cs = ConstraintSystem::<F>::new_ref();
        circuit.clone().generate_constraints(cs.clone())?;
        if !cs.is_satisfied()? {
            return Err(ProveError::Unsatisfied);
        }

        let proof = Groth16::<Curve>::prove(&self.keys.pk, circuit, rng)?;
        Ok(AuthProof {
            proof,
            public_inputs: witness.public_inputs(),
            commitment: witness.commitment,
        })
    }
}

/// Verifier pipeline over the process-wide keys.
pub struct Verifier<'a> {
    /// Immutable key material generated at startup.
    pub keys: &'a AuthKeys,
}

impl Verifier<'_> {
    /// Verify a proof against a trusted `(commitment, challenge)` pair.
    ///
    /// The bound challenge is recomputed here; a client-supplied value is
    /// never part of the interface.
    pub fn verify(
        &self,
        proof: &Proof<Curve>,
        commitment: F,
        challenge: F,
    ) -> Result<bool, VerifyError> {
        let bound_challenge = crate::mimc::hash(&[commitment, challenge]);
        let inputs = [commitment, challenge, bound_challenge];
        Ok(Groth16::<Curve>::verify_with_processed_vk(
            &self.keys.pvk,
            &inputs,
            proof,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire;
    use std::sync::OnceLock;

    static KEYS: OnceLock<AuthKeys> = OnceLock::new();

    fn keys() -> &'static AuthKeys {
        KEYS.get_or_init(|| {
            AuthKeys::generate(&mut rand::thread_rng()).expect("setup must succeed")
        })
    }

    fn attempt(secret: Vec<i64>, candidate: Vec<i64>, password: &str, challenge: &str) -> AuthAttempt {
        AuthAttempt {
            secret,
            candidate,
            password: password.to_string(),
            salt: "12345".to_string(),
            challenge: challenge.to_string(),
        }
    }

    fn ascending() -> Vec<i64> {
        (1..=FEATURE_LEN as i64).collect()
    }

    #[test]
    fn honest_round_trip_verifies() {
        let keys = keys();
        let att = attempt(
            ascending(),
            ascending(),
            "correct horse battery staple",
            "99999",
        );
        let auth = Prover { keys }
            .prove(&att, &mut rand::thread_rng())
            .unwrap();

        let verifier = Verifier { keys };
        let valid = verifier
            .verify(&auth.proof, auth.commitment, F::from(99999u64))
            .unwrap();
        assert!(valid);

        // The public slice carries exactly commitment, challenge, bound.
        assert_eq!(auth.public_inputs.len(), 3);
        assert_eq!(auth.public_inputs[0], auth.commitment);
        assert_eq!(auth.public_inputs[1], F::from(99999u64));
    }

    #[test]
    fn commitment_is_deterministic() {
        let att = attempt(ascending(), ascending(), "pw", "1");
        let a = assemble_witness(&att).unwrap();
        let b = assemble_witness(&att).unwrap();
        assert_eq!(a.commitment, b.commitment);
        assert_eq!(a.bound_challenge, b.bound_challenge);
    }

    #[test]
    fn replayed_proof_fails_on_new_challenge() {
        let keys = keys();
        let att = attempt(ascending(), ascending(), "pw", "99999");
        let auth = Prover { keys }
            .prove(&att, &mut rand::thread_rng())
            .unwrap();

        let verifier = Verifier { keys };
        assert!(verifier
            .verify(&auth.proof, auth.commitment, F::from(99999u64))
            .unwrap());
        assert!(!verifier
            .verify(&auth.proof, auth.commitment, F::from(88888u64))
            .unwrap());
    }

    #[test]
    fn proof_is_bound_to_commitment() {
        let keys = keys();
        let att = attempt(ascending(), ascending(), "pw", "7");
        let auth = Prover { keys }
            .prove(&att, &mut rand::thread_rng())
            .unwrap();

        let wrong_commitment = auth.commitment + F::from(1u64);
        assert!(!Verifier { keys }
            .verify(&auth.proof, wrong_commitment, F::from(7u64))
            .unwrap());
    }

    #[test]
    fn candidate_within_tolerance_verifies() {
        let keys = keys();
        let att = attempt(vec![0; FEATURE_LEN], vec![3; FEATURE_LEN], "pw", "42");
        let auth = Prover { keys }
            .prove(&att, &mut rand::thread_rng())
            .unwrap();
        assert!(Verifier { keys }
            .verify(&auth.proof, auth.commitment, F::from(42u64))
            .unwrap());
    }

    #[test]
    fn candidate_out_of_tolerance_is_refused() {
        let keys = keys();
        let mut candidate = vec![0i64; FEATURE_LEN];
        candidate[FEATURE_LEN - 1] = 4;
        let att = attempt(vec![0; FEATURE_LEN], candidate, "pw", "42");
        let err = Prover { keys }
            .prove(&att, &mut rand::thread_rng())
            .unwrap_err();
        assert!(matches!(err, ProveError::Unsatisfied));
    }

    #[test]
    fn negative_coordinates_round_trip() {
        let keys = keys();
        let secret: Vec<i64> = (0..FEATURE_LEN as i64).map(|i| i - 30).collect();
        let candidate: Vec<i64> = secret.iter().map(|x| x + 2).collect();
        let att = attempt(secret, candidate, "pw", "13");
        let auth = Prover { keys }
            .prove(&att, &mut rand::thread_rng())
            .unwrap();
        assert!(Verifier { keys }
            .verify(&auth.proof, auth.commitment, F::from(13u64))
            .unwrap());
    }

    #[test]
    fn wrong_password_yields_foreign_commitment() {
        let keys = keys();
        let enrolled = Prover { keys }
            .prove(
                &attempt(ascending(), ascending(), "A", "5"),
                &mut rand::thread_rng(),
            )
            .unwrap();
        let imposter = Prover { keys }
            .prove(
                &attempt(ascending(), ascending(), "B", "5"),
                &mut rand::thread_rng(),
            )
            .unwrap();

        assert_ne!(imposter.commitment, enrolled.commitment);
        // Against the enrolled commitment the imposter's proof is rejected.
        assert!(!Verifier { keys }
            .verify(&imposter.proof, enrolled.commitment, F::from(5u64))
            .unwrap());
    }

    #[test]
    fn empty_challenge_defaults_to_zero() {
        let keys = keys();
        let att = attempt(ascending(), ascending(), "pw", "");
        let auth = Prover { keys }
            .prove(&att, &mut rand::thread_rng())
            .unwrap();
        assert_eq!(auth.public_inputs[1], F::from(0u64));
        assert!(Verifier { keys }
            .verify(&auth.proof, auth.commitment, F::from(0u64))
            .unwrap());
    }

    #[test]
    fn bad_shapes_and_numerals_are_rejected() {
        let short = AuthAttempt {
            secret: vec![1; FEATURE_LEN - 1],
            candidate: vec![1; FEATURE_LEN - 1],
            password: "pw".into(),
            salt: "12345".into(),
            challenge: "1".into(),
        };
        assert!(matches!(
            assemble_witness(&short).unwrap_err(),
            ProveError::BadShape { .. }
        ));

        let bad_salt = attempt(ascending(), ascending(), "pw", "1");
        let bad_salt = AuthAttempt {
            salt: "not-a-number".into(),
            ..bad_salt
        };
        assert!(matches!(
            assemble_witness(&bad_salt).unwrap_err(),
            ProveError::Numeral(_)
        ));
    }

    #[test]
    fn proof_and_witness_survive_the_wire() {
        let keys = keys();
        let att = attempt(ascending(), ascending(), "pw", "314159");
        let auth = Prover { keys }
            .prove(&att, &mut rand::thread_rng())
            .unwrap();

        let proof_text = wire::to_base64(&auth.proof).unwrap();
        let witness_text = wire::to_base64(&auth.public_inputs).unwrap();

        let proof_back: Proof<Curve> = wire::from_base64(&proof_text).unwrap();
        let witness_back: Vec<F> = wire::from_base64(&witness_text).unwrap();
        assert_eq!(proof_back, auth.proof);
        assert_eq!(witness_back, auth.public_inputs);

        assert!(Verifier { keys }
            .verify(&proof_back, witness_back[0], witness_back[1])
            .unwrap());
    }

    #[test]
    fn setup_metrics_are_cached_and_positive() {
        let keys = keys();
        assert!(keys.nb_constraints > 0);
        assert!(keys.pk_size_bytes > keys.vk_size_bytes);
        assert!(keys.vk_size_bytes > 0);
    }
}
