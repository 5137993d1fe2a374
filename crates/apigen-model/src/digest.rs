//! Model digests.
//!
//! A digest is SHA-256 over the compact JSON serialization of the model. All
//! registry maps and query-parameter sets are ordered, so two builds over the
//! same input produce the same digest.

use sha2::{Digest as _, Sha256};

use crate::api::Api;

/// Prefix used in serialized digests.
pub const MODEL_DIGEST_PREFIX: &str = "sha256:";

/// Compute the digest of a built model, as `"sha256:<64 lowercase hex digits>"`.
pub fn model_digest(api: &Api) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(api)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hasher.finalize();

    let mut out = String::with_capacity(MODEL_DIGEST_PREFIX.len() + 64);
    out.push_str(MODEL_DIGEST_PREFIX);
    out.extend(digest.iter().map(|b| format!("{b:02x}")));
    Ok(out)
}
