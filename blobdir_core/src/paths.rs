//! On-disk layout of blobs inside a store root.
//!
//! `blake3-abcdef…` is stored at `blake3/ab/cd/ef…`.

use crate::BlobRef;

pub fn blob_path_for_ref(blob_ref: &BlobRef) -> Option<String> {
    if !blob_ref.is_valid() {
        return None;
    }
    let name = blob_ref.hash_name()?;
    let digest = blob_ref.digest()?;
    Some(format!(
        "{}/{}/{}/{}",
        name,
        &digest[0..2],
        &digest[2..4],
        &digest[4..]
    ))
}
