//! biozkp_api: the HTTP façade over the zero-knowledge authentication core.
//!
//! Endpoints (JSON):
//! - GET  /health    -> { status }
//! - GET  /version   -> api/proof-system identifiers + circuit parameters
//! - POST /prove     ProveReq -> ProveRes (base64 proof + public witness,
//!                   decimal commitment, cached setup metrics)
//! - POST /verify    VerifyReq -> { valid }
//!
//! Status mapping:
//! - 400: malformed JSON, wrong vector length, unparsable numerals, or a
//!   proof that does not decode.
//! - 403: the prove inputs do not satisfy the authentication predicate
//!   (candidate out of tolerance); no proof is returned.
//! - 500: stretching or witness-synthesis faults.
//! - Verification mismatch is **200 with `valid: false`** — an expected
//!   operational outcome, not a server error.
//!
//! Setup (circuit compile + Groth16 key generation) runs to completion
//! before the listener binds; a setup failure aborts the process. Keys are
//! immutable and shared read-only afterwards. Proving and the 64 MiB
//! Argon2id stretch run on the blocking pool behind a small semaphore so
//! concurrent proves cannot exhaust memory.

#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use ark_groth16::Proof;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use biozkp::pipeline::ProveError;
use biozkp::{field, wire, AuthAttempt, AuthKeys, Curve, Prover, Verifier, FEATURE_LEN, MATCH_THRESHOLD};

// ------------------------------ Types ------------------------------

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct Version {
    api: &'static str,
    proof_system: &'static str,
    curve: &'static str,
    feature_len: usize,
    match_threshold: u64,
}

#[derive(Deserialize)]
struct ProveReq {
    secret: Vec<i64>,
    #[serde(default)]
    candidate: Option<Vec<i64>>,
    password: String,
    salt: String,
    #[serde(default)]
    challenge: Option<String>,
}

#[derive(Serialize)]
struct ProveRes {
    proof: String,
    public_witness: String,
    commitment: String,
    nb_constraints: usize,
    pk_size_bytes: usize,
    vk_size_bytes: usize,
}

#[derive(Deserialize)]
struct VerifyReq {
    proof: String,
    commitment: String,
    challenge: String,
}

#[derive(Serialize)]
struct VerifyRes {
    valid: bool,
}

#[derive(Clone)]
struct AppState {
    keys: Arc<AuthKeys>,
    prove_permits: Arc<Semaphore>,
}

// ------------------------------ Handlers ------------------------------

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn version() -> Json<Version> {
    Json(Version {
        api: "biozkp-api/0.1",
        proof_system: "groth16",
        curve: "bn254",
        feature_len: FEATURE_LEN,
        match_threshold: MATCH_THRESHOLD,
    })
}

async fn prove(
    State(st): State<AppState>,
    body: Result<Json<ProveReq>, JsonRejection>,
) -> Result<Json<ProveRes>, (StatusCode, String)> {
    let Json(req) = body.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let candidate = req.candidate.unwrap_or_else(|| req.secret.clone());
    let attempt = AuthAttempt {
        secret: req.secret,
        candidate,
        password: req.password,
        salt: req.salt,
        challenge: req.challenge.unwrap_or_default(),
    };

    // One permit per in-flight prove: each holds 64 MiB of Argon2 memory
    // plus the Groth16 proving working set.
    let permit = st
        .prove_permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let keys = st.keys.clone();
    let started = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || {
        let prover = Prover { keys: &keys };
        prover.prove(&attempt, &mut OsRng)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("prove task: {e}")))?;
    drop(permit);

    let auth = match outcome {
        Ok(auth) => auth,
        Err(e @ (ProveError::BadShape { .. } | ProveError::Numeral(_))) => {
            return Err((StatusCode::BAD_REQUEST, e.to_string()));
        }
        Err(ProveError::Unsatisfied) => {
            info!(elapsed = ?started.elapsed(), "prove refused: predicate unsatisfied");
            return Err((
                StatusCode::FORBIDDEN,
                "inputs do not satisfy the authentication predicate".into(),
            ));
        }
        Err(e) => {
            warn!(error = %e, "prove failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };

    info!(elapsed = ?started.elapsed(), "proof generated");

    let proof = wire::to_base64(&auth.proof)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let public_witness = wire::to_base64(&auth.public_inputs)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ProveRes {
        proof,
        public_witness,
        commitment: field::to_decimal(&auth.commitment),
        nb_constraints: st.keys.nb_constraints,
        pk_size_bytes: st.keys.pk_size_bytes,
        vk_size_bytes: st.keys.vk_size_bytes,
    }))
}

async fn verify(
    State(st): State<AppState>,
    body: Result<Json<VerifyReq>, JsonRejection>,
) -> Result<Json<VerifyRes>, (StatusCode, String)> {
    let Json(req) = body.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let proof: Proof<Curve> = wire::from_base64(&req.proof)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("bad proof: {e}")))?;
    let commitment = field::from_decimal(&req.commitment)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let challenge = field::from_decimal_or_zero(&req.challenge)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let verifier = Verifier { keys: &st.keys };
    let valid = verifier
        .verify(&proof, commitment, challenge)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(VerifyRes { valid }))
}

// ------------------------------ Main ------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "biozkp_api=info,tower_http=info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    info!(
        feature_len = FEATURE_LEN,
        match_threshold = MATCH_THRESHOLD,
        "compiling circuit and running Groth16 setup"
    );
    let started = Instant::now();
    let keys = AuthKeys::generate(&mut OsRng).context("Groth16 setup failed")?;
    info!(
        nb_constraints = keys.nb_constraints,
        pk_size_bytes = keys.pk_size_bytes,
        vk_size_bytes = keys.vk_size_bytes,
        vk_digest = %hex::encode(&keys.vk_digest[..8]),
        elapsed = ?started.elapsed(),
        "setup complete"
    );

    let prove_permits = std::env::var("BIOZKP_PROVE_PERMITS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(4usize);

    let addr: SocketAddr = std::env::var("BIOZKP_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

    let app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/prove", post(prove))
        .route("/verify", post(verify))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(AppState {
            keys: Arc::new(keys),
            prove_permits: Arc::new(Semaphore::new(prove_permits)),
        })
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr).await?;
    info!("biozkp API listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
