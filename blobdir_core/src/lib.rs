//! Core blobdir types and traits.
//!
//! This crate defines what every other blobdir crate shares:
//!
//! - Blob references (`blobref::BlobRef`), the content-derived names of
//!   immutable blobs
//! - The read capability (`Fetcher`) and its write counterpart
//!   (`BlobWriter`) that stores implement
//! - The path layout stores use to place blobs on disk (`paths`)
//!
//! Store implementations live in their own crates; the schema layer that
//! turns directory blobs into listings lives in `blobdir_schema`.

pub mod blobref;
pub mod fetch;
pub mod paths;

// Test utilities (behind feature flag)
#[cfg(feature = "testutil")]
pub mod testutil;

pub use blobref::{BlobRef, BlobRefError};
pub use fetch::{BlobReader, BlobWriter, FetchResult, FetchedBlob, Fetcher, StoreError};
