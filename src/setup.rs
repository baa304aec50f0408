//! Groth16 setup and key management
//!
//! One-shot compilation of the authentication circuit and generation of the
//! proving/verifying key pair, performed at process start **before** any
//! request is served. The resulting [`AuthKeys`] is immutable for the
//! process lifetime and safe to share read-only across handler threads.
//!
//! Each process instance runs its own setup; no key material is read from or
//! written to disk. Deployments that need a common reference string across
//! instances would load a shared `(pk, vk)` here instead — a documented
//! extension point, not implemented.
//!
//! Alongside the keys we cache the metrics the prove response reports:
//! constraint count and compressed key sizes, plus a BLAKE3 digest of the
//! verifying key for startup logs.

use ark_groth16::{Groth16, PreparedVerifyingKey, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisError, SynthesisMode,
};
use ark_serialize::{CanonicalSerialize, SerializationError};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};

use crate::{circuit::AuthCircuit, Curve, F};

/// Errors that abort process start.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Circuit compilation or key generation failed.
    #[error("circuit setup failed: {0}")]
    Synthesis(#[from] SynthesisError),
    /// Key material could not be serialized for size accounting.
    #[error("key serialization failed: {0}")]
    Serialization(#[from] SerializationError),
}

/// Immutable per-process key material and cached setup metrics.
pub struct AuthKeys {
    /// Groth16 proving key.
    pub pk: ProvingKey<Curve>,
    /// Groth16 verifying key.
    pub vk: VerifyingKey<Curve>,
    /// Processed verifying key, precomputed for the hot verify path.
    pub pvk: PreparedVerifyingKey<Curve>,
    /// Number of R1CS constraints in the compiled circuit.
    pub nb_constraints: usize,
    /// Compressed proving-key size in bytes.
    pub pk_size_bytes: usize,
    /// Compressed verifying-key size in bytes.
    pub vk_size_bytes: usize,
    /// BLAKE3 digest of the compressed verifying key.
    pub vk_digest: [u8; 32],
}

impl AuthKeys {
    /// Compile the circuit and run the Groth16 setup.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, SetupError> {
        // Count constraints the way the prover's own reduction sees them.
        let cs = ConstraintSystem::<F>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Setup);
        AuthCircuit::blank().generate_constraints(cs.clone())?;
        cs.finalize();
        let nb_constraints = cs.num_constraints();

        let (pk, vk) = Groth16::<Curve>::circuit_specific_setup(AuthCircuit::blank(), rng)?;
        let pvk = Groth16::<Curve>::process_vk(&vk)?;

        let pk_size_bytes = pk.compressed_size();
        let mut vk_bytes = Vec::new();
        vk.serialize_compressed(&mut vk_bytes)?;
        let vk_size_bytes = vk_bytes.len();
        let vk_digest = *blake3::hash(&vk_bytes).as_bytes();

        Ok(Self {
            pk,
            vk,
            pvk,
            nb_constraints,
            pk_size_bytes,
            vk_size_bytes,
            vk_digest,
        })
    }
}
