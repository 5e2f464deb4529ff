//! Content-derived blob references.
//!
//! A reference is written `<hashname>-<digest>`, where the digest is the
//! lowercase hex encoding of the blob's hash, e.g.
//! `sha1-f1d2d2f924e986ac86fdf7b36c94bcdf32beec15`.

use std::{borrow::Borrow, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Hash functions a reference may name, with their digest length in hex chars.
const HASH_FUNCTIONS: &[(&str, usize)] = &[
    ("sha1", 40),
    ("sha224", 56),
    ("sha256", 64),
    ("blake3", 64),
];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobRefError {
    #[error("blobref is empty")]
    Empty,
    #[error("blobref {0:?} has no hash name separator")]
    MissingSeparator(String),
    #[error("blobref {0:?} names an unknown hash function")]
    UnknownHash(String),
    #[error("blobref {0:?} has a malformed digest")]
    BadDigest(String),
}

/// Reference to an immutable blob.
///
/// A `BlobRef` can hold any string so that schema documents carrying
/// malformed references still decode; [`BlobRef::is_valid`] decides
/// whether it may be fetched.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    /// Parses and validates a textual reference.
    pub fn parse(s: &str) -> Result<Self, BlobRefError> {
        let blob_ref = Self(s.to_owned());
        blob_ref.check()?;
        Ok(blob_ref)
    }

    /// Wraps a string without validating it.
    pub fn from_unchecked(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Reference for `content` under blake3.
    pub fn for_content(content: impl AsRef<[u8]>) -> Self {
        let hash = blake3::hash(content.as_ref());
        Self(format!("blake3-{}", hash.to_hex()))
    }

    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }

    /// Checks that the reference is well formed.
    pub fn check(&self) -> Result<(), BlobRefError> {
        if self.0.is_empty() {
            return Err(BlobRefError::Empty);
        }
        let (name, digest) = self
            .0
            .split_once('-')
            .ok_or_else(|| BlobRefError::MissingSeparator(self.0.clone()))?;
        let expected_len = HASH_FUNCTIONS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, len)| *len)
            .ok_or_else(|| BlobRefError::UnknownHash(self.0.clone()))?;
        let lower_hex = digest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if digest.len() != expected_len || !lower_hex || hex::decode(digest).is_err() {
            return Err(BlobRefError::BadDigest(self.0.clone()));
        }
        Ok(())
    }

    /// Hash function name, if the reference has one.
    pub fn hash_name(&self) -> Option<&str> {
        self.0.split_once('-').map(|(name, _)| name)
    }

    /// Hex digest, if the reference has one.
    pub fn digest(&self) -> Option<&str> {
        self.0.split_once('-').map(|(_, digest)| digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines.
    pub fn fmt_short(&self) -> String {
        match self.0.split_once('-') {
            Some((name, digest)) if digest.len() > 10 => format!("{name}-{}", &digest[..10]),
            _ => self.0.clone(),
        }
    }
}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlobRef").field(&self.0).finish()
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BlobRef {
    type Err = BlobRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for BlobRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BlobRef {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<BlobRef> for String {
    fn from(value: BlobRef) -> Self {
        value.0
    }
}
