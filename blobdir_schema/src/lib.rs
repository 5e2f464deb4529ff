//! # blobdir schema layer
//!
//! Turns a reference to a `directory` schema blob into an ordered listing
//! of its entries. Directories are stored as a small graph of immutable
//! JSON blobs:
//!
//! ```text
//! directory ──entries──▶ static-set ──members──▶ file | directory | symlink
//! ```
//!
//! ## Layers
//! 1. `schema` – decoding (and building) schema documents, `resolve`.
//! 2. `entry` – the closed set of entry variants and the per-member
//!    resolver capability.
//! 3. `dir_reader` – lazy static-set resolution and paginated,
//!    concurrent listing.
//! 4. `debug` – recursive tree rendering on top of `DirReader`.

mod config;
pub mod debug;
pub mod dir_reader;
pub mod entry;
mod error;
pub mod schema;
mod spawn;

pub use config::{DEFAULT_MAX_CONCURRENT_FETCHES, ReaderConfig};
pub use dir_reader::{DirReader, ReadStatus, ReaddirPage};
pub use entry::{
    DirectoryEntry, EntryKind, EntryResolver, FileEntry, OtherEntry, SchemaEntryResolver,
    SubdirEntry, SymlinkEntry,
};
pub use error::{SchemaError, SchemaResult};
pub use schema::{BlobPart, SchemaBlob, resolve};
