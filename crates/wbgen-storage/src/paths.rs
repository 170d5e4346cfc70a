//! Canonical object paths for stored blobs.
//!
//! Paths are namespaced by user and job so concurrent jobs never collide
//! and a whole job's output can be addressed by prefix.

use wbgen_core::types::id::{JobId, UserId};

/// Path for a generated asset: `{user}/{job}/{index}_{kind}.{ext}`.
pub fn generated_asset(
    user_id: UserId,
    job_id: JobId,
    card_index: i32,
    kind: &str,
    extension: &str,
) -> String {
    format!("{user_id}/{job_id}/{card_index}_{kind}.{extension}")
}

/// Path for an uploaded source image: `{user}/{job}/sources/{index}.{ext}`.
pub fn source_image(user_id: UserId, job_id: JobId, index: usize, extension: &str) -> String {
    format!("{user_id}/{job_id}/sources/{index}.{extension}")
}
