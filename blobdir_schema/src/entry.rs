//! Directory entries: the materialized view of one static-set member.

use async_trait::async_trait;
use blobdir_core::{BlobRef, Fetcher};

use crate::{
    SchemaError, SchemaResult,
    schema::{self, SchemaBlob, TYPE_DIRECTORY, TYPE_FILE, TYPE_SYMLINK},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "dir",
            EntryKind::Symlink => "symlink",
            EntryKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub blob_ref: BlobRef,
    pub name: String,
    pub size: u64,
    pub permission: Option<u32>,
    pub mtime: Option<String>,
}

/// A nested directory. `blob_ref` is the directory schema blob, suitable
/// for opening another [`DirReader`](crate::DirReader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdirEntry {
    pub blob_ref: BlobRef,
    pub name: String,
    pub permission: Option<u32>,
    pub mtime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkEntry {
    pub blob_ref: BlobRef,
    pub name: String,
    pub target: String,
}

/// A member whose schema type has no dedicated variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherEntry {
    pub blob_ref: BlobRef,
    pub name: Option<String>,
    pub blob_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEntry {
    File(FileEntry),
    Directory(SubdirEntry),
    Symlink(SymlinkEntry),
    Other(OtherEntry),
}

impl DirectoryEntry {
    /// Builds an entry from an already decoded member blob, dispatching
    /// on its schema type.
    pub fn from_schema(blob_ref: &BlobRef, blob: &SchemaBlob) -> SchemaResult<Self> {
        match blob.blob_type.as_str() {
            TYPE_FILE => decode_file(blob_ref, blob).map(Self::File),
            TYPE_DIRECTORY => decode_directory(blob_ref, blob).map(Self::Directory),
            TYPE_SYMLINK => decode_symlink(blob_ref, blob).map(Self::Symlink),
            _ => Ok(Self::Other(OtherEntry {
                blob_ref: blob_ref.clone(),
                name: blob.file_name.clone(),
                blob_type: blob.blob_type.clone(),
            })),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Self::File(_) => EntryKind::File,
            Self::Directory(_) => EntryKind::Directory,
            Self::Symlink(_) => EntryKind::Symlink,
            Self::Other(_) => EntryKind::Other,
        }
    }

    /// Entry name; empty for unnamed `Other` members.
    pub fn name(&self) -> &str {
        match self {
            Self::File(file) => &file.name,
            Self::Directory(dir) => &dir.name,
            Self::Symlink(link) => &link.name,
            Self::Other(other) => other.name.as_deref().unwrap_or_default(),
        }
    }

    /// The member blob this entry was resolved from.
    pub fn blob_ref(&self) -> &BlobRef {
        match self {
            Self::File(file) => &file.blob_ref,
            Self::Directory(dir) => &dir.blob_ref,
            Self::Symlink(link) => &link.blob_ref,
            Self::Other(other) => &other.blob_ref,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory(_))
    }
}

fn require_name(blob_ref: &BlobRef, blob: &SchemaBlob) -> SchemaResult<String> {
    blob.file_name
        .clone()
        .ok_or_else(|| SchemaError::MissingField {
            blob_ref: blob_ref.clone(),
            blob_type: blob.blob_type.clone(),
            field: "fileName",
        })
}

fn decode_file(blob_ref: &BlobRef, blob: &SchemaBlob) -> SchemaResult<FileEntry> {
    Ok(FileEntry {
        blob_ref: blob_ref.clone(),
        name: require_name(blob_ref, blob)?,
        size: blob.parts_size(),
        permission: blob.permission(),
        mtime: blob.unix_mtime.clone(),
    })
}

fn decode_directory(blob_ref: &BlobRef, blob: &SchemaBlob) -> SchemaResult<SubdirEntry> {
    Ok(SubdirEntry {
        blob_ref: blob_ref.clone(),
        name: require_name(blob_ref, blob)?,
        permission: blob.permission(),
        mtime: blob.unix_mtime.clone(),
    })
}

fn decode_symlink(blob_ref: &BlobRef, blob: &SchemaBlob) -> SchemaResult<SymlinkEntry> {
    let target = blob
        .symlink_target
        .clone()
        .ok_or_else(|| SchemaError::MissingField {
            blob_ref: blob_ref.clone(),
            blob_type: blob.blob_type.clone(),
            field: "symlinkTarget",
        })?;
    Ok(SymlinkEntry {
        blob_ref: blob_ref.clone(),
        name: require_name(blob_ref, blob)?,
        target,
    })
}

/// Turns one member reference into a [`DirectoryEntry`].
///
/// Called concurrently from spawned tasks, one call per member.
#[async_trait]
pub trait EntryResolver: Send + Sync + 'static {
    async fn resolve_entry(
        &self,
        fetcher: &dyn Fetcher,
        blob_ref: &BlobRef,
    ) -> SchemaResult<DirectoryEntry>;
}

/// Resolves members by fetching and decoding their schema blob.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaEntryResolver;

#[async_trait]
impl EntryResolver for SchemaEntryResolver {
    async fn resolve_entry(
        &self,
        fetcher: &dyn Fetcher,
        blob_ref: &BlobRef,
    ) -> SchemaResult<DirectoryEntry> {
        let blob = schema::resolve(fetcher, blob_ref).await?;
        DirectoryEntry::from_schema(blob_ref, &blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BlobPart;

    fn member() -> BlobRef {
        BlobRef::for_content(b"member")
    }

    #[test]
    fn file_size_sums_parts() {
        let blob = SchemaBlob::file(
            "a.bin",
            vec![
                BlobPart::new(BlobRef::for_content(b"p1"), 100),
                BlobPart::new(BlobRef::for_content(b"p2"), 23),
            ],
        )
        .with_permission(0o600);
        let entry = DirectoryEntry::from_schema(&member(), &blob).unwrap();
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(entry.name(), "a.bin");
        match entry {
            DirectoryEntry::File(file) => {
                assert_eq!(file.size, 123);
                assert_eq!(file.permission, Some(0o600));
            }
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn directory_entry_points_at_member_blob() {
        let blob = SchemaBlob::directory("sub", BlobRef::for_content(b"set"));
        let entry = DirectoryEntry::from_schema(&member(), &blob).unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.blob_ref(), &member());
    }

    #[test]
    fn symlink_requires_target() {
        let mut blob = SchemaBlob::symlink("link", "../target");
        let entry = DirectoryEntry::from_schema(&member(), &blob).unwrap();
        assert!(matches!(
            &entry,
            DirectoryEntry::Symlink(link) if link.target == "../target"
        ));

        blob.symlink_target = None;
        let err = DirectoryEntry::from_schema(&member(), &blob).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MissingField { field: "symlinkTarget", .. }
        ));
    }

    #[test]
    fn unnamed_file_is_rejected() {
        let mut blob = SchemaBlob::file("x", Vec::new());
        blob.file_name = None;
        let err = DirectoryEntry::from_schema(&member(), &blob).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { field: "fileName", .. }));
    }

    #[test]
    fn unknown_type_becomes_other() {
        let blob = SchemaBlob::static_set(Vec::new());
        let entry = DirectoryEntry::from_schema(&member(), &blob).unwrap();
        assert_eq!(entry.kind(), EntryKind::Other);
        assert_eq!(entry.name(), "");
        assert!(matches!(
            entry,
            DirectoryEntry::Other(OtherEntry { ref blob_type, .. }) if blob_type == "static-set"
        ));
    }
}
