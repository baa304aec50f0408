//! Wire encoding
//!
//! Proofs and witnesses cross the HTTP boundary as the arkworks canonical
//! **compressed** encoding wrapped in standard base64. Decoding is symmetric
//! and byte-for-byte round-trips.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Errors at the wire boundary.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Canonical serialization failed (internal fault).
    #[error("canonical encode failed: {0}")]
    Encode(SerializationError),
    /// The text was not valid base64.
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The bytes did not decode as the expected canonical value.
    #[error("canonical decode failed: {0}")]
    Decode(SerializationError),
}

/// Encode a canonical value as base64 text.
pub fn to_base64<T: CanonicalSerialize>(value: &T) -> Result<String, WireError> {
    let mut bytes = Vec::with_capacity(value.compressed_size());
    value
        .serialize_compressed(&mut bytes)
        .map_err(WireError::Encode)?;
    Ok(STANDARD.encode(bytes))
}

/// Decode base64 text back into a canonical value.
pub fn from_base64<T: CanonicalDeserialize>(text: &str) -> Result<T, WireError> {
    let bytes = STANDARD.decode(text.trim())?;
    T::deserialize_compressed(bytes.as_slice()).map_err(WireError::Decode)
}
