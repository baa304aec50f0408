//! Crate root: public surface, core aliases, and protocol-wide invariants
//!
//! `biozkp` is the zero-knowledge core of a biometric authentication service.
//! A prover convinces a verifier that it knows an enrolled feature vector,
//! a password, and a salt whose MiMC commitment equals a public commitment,
//! that a freshly presented candidate vector lies within a bounded
//! per-coordinate distance of the enrolled one, and that the proof was
//! generated with knowledge of the verifier's session challenge — without
//! revealing the biometric, the password, or the salt.
//!
//! ## Invariants
//!
//! - **Field & curve.** All circuit arithmetic lives in `ark_bn254::Fr`
//!   (`F` in this crate), the scalar field of BN254. Proofs are Groth16 over
//!   BN254. We **forbid unsafe** throughout the crate.
//!
//! - **One hash, two bodies.** The MiMC sponge exists twice — off-circuit
//!   over `F` ([`mimc`]) and in-circuit over `FpVar<F>` ([`circuit`]) — and
//!   the two MUST produce identical digests for identical absorb schedules.
//!   Both read one process-wide round-constant table.
//!
//! - **Public-input layout.** The circuit allocates its public inputs in the
//!   fixed order `commitment`, `challenge`, `bound_challenge`. The verifier
//!   reconstructs exactly this slice from trusted server-side values; a
//!   client-supplied bound challenge is never accepted.
//!
//! - **Setup before serve.** Proving and verifying keys are generated once
//!   at process start ([`setup::AuthKeys`]) and are immutable afterwards.
//!   Handlers only ever read them.
//!
//! If any invariant is violated at runtime, the failure mode is a precise
//! error (never UB).

#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms)]

/// Field arithmetic layer: big-integer / byte / decimal-string boundaries.
pub mod field;
/// ZK-friendly MiMC sponge, off-circuit half, plus the round-constant table.
pub mod mimc;
/// Memory-hard password stretching (Argon2id → field element).
pub mod stretch;
/// The authentication circuit and the in-circuit MiMC gadget.
pub mod circuit;
/// One-shot Groth16 setup and immutable key material.
pub mod setup;
/// Prover and verifier pipelines over typed witnesses.
pub mod pipeline;
/// Canonical base64 wire encoding for proofs and witnesses.
pub mod wire;

/// Scalar field used across the crate (BN254).
pub type F = ark_bn254::Fr;

/// Pairing engine the proofs are produced over.
pub type Curve = ark_bn254::Bn254;

/// Number of feature coordinates per biometric vector (30 minutiae × 2).
pub const FEATURE_LEN: usize = 60;

/// Per-coordinate match tolerance `T`; the circuit enforces `Δ² ≤ T²`.
pub const MATCH_THRESHOLD: u64 = 3;

/// Fixed serialized width of one field element, in bytes.
pub const FIELD_BYTES: usize = 32;

pub use crate::pipeline::{AuthAttempt, AuthProof, Prover, Verifier};
pub use crate::setup::AuthKeys;
