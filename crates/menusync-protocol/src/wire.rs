//! Transport-agnostic envelope codecs.
//!
//! MessagePack is the wire format; the JSON variants exist for logs and
//! diagnostic tooling. Decoding always marks the envelope as remote: anything
//! arriving through this path is by definition a replay.

use rmp_serde::{decode, encode};
use thiserror::Error;

use crate::envelope::ActionEnvelope;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("encode error: {0}")]
    Encode(#[from] encode::Error),
    #[error("decode error: {0}")]
    Decode(#[from] decode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn serialize_envelope(envelope: &ActionEnvelope) -> Result<Vec<u8>, WireError> {
    Ok(encode::to_vec(envelope)?)
}

pub fn deserialize_envelope(bytes: &[u8]) -> Result<ActionEnvelope, WireError> {
    let mut envelope: ActionEnvelope = decode::from_slice(bytes)?;
    envelope.remote = true;
    Ok(envelope)
}

pub fn serialize_envelope_json(envelope: &ActionEnvelope) -> Result<String, WireError> {
    Ok(serde_json::to_string(envelope)?)
}

pub fn deserialize_envelope_json(json: &str) -> Result<ActionEnvelope, WireError> {
    let mut envelope: ActionEnvelope = serde_json::from_str(json)?;
    envelope.remote = true;
    Ok(envelope)
}

/// Deterministic, stable 64-bit hash for raw bytes (FNV-1a).
///
/// Used for catalog-shape digests so peers can compare what they built.
pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
