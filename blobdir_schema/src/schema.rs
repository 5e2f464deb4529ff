//! Schema blobs: typed JSON documents describing the object graph.
//!
//! A schema blob is a JSON object whose `type` field (`camliType` in
//! older blobs) selects which other fields are meaningful:
//!
//! ```json
//! {"camliVersion": 1, "type": "directory", "fileName": "src", "entries": "sha1-…"}
//! {"camliVersion": 1, "type": "static-set", "members": ["sha1-…", "sha1-…"]}
//! ```

use blobdir_core::{BlobRef, Fetcher};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::{SchemaError, SchemaResult};

pub const TYPE_DIRECTORY: &str = "directory";
pub const TYPE_STATIC_SET: &str = "static-set";
pub const TYPE_FILE: &str = "file";
pub const TYPE_SYMLINK: &str = "symlink";

/// Current schema version written by the builders.
pub const SCHEMA_VERSION: u32 = 1;

/// Upper bound on the read buffer reserved up front from a fetcher's
/// reported size.
const MAX_PREALLOC: u64 = 1 << 20;

/// One contiguous chunk of a file's contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlobPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_ref: Option<BlobRef>,
    pub size: u64,
}

impl BlobPart {
    pub fn new(blob_ref: BlobRef, size: u64) -> Self {
        Self {
            blob_ref: Some(blob_ref),
            size,
        }
    }
}

/// Decoded schema document.
///
/// Holds the union of the fields used by the schema types this crate
/// understands; fields irrelevant to a blob's type are left empty and
/// unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaBlob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camli_version: Option<u32>,
    #[serde(rename = "type", alias = "camliType")]
    pub blob_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// For directories: the static-set listing the members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<BlobRef>,
    /// For static-sets: members in listing order.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub members: Vec<BlobRef>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub parts: Vec<BlobPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink_target: Option<String>,
    /// Octal mode string, e.g. `"0644"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_permission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_owner_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_group_id: Option<u32>,
    /// RFC 3339 modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_mtime: Option<String>,
}

/// Reads an explicit `null` list the same as an absent one.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl SchemaBlob {
    fn with_type(blob_type: &str) -> Self {
        Self {
            camli_version: Some(SCHEMA_VERSION),
            blob_type: blob_type.to_string(),
            file_name: None,
            entries: None,
            members: Vec::new(),
            parts: Vec::new(),
            symlink_target: None,
            unix_permission: None,
            unix_owner_id: None,
            unix_group_id: None,
            unix_mtime: None,
        }
    }

    /// A named directory whose members are listed by the static-set
    /// at `entries`.
    pub fn directory(name: impl Into<String>, entries: BlobRef) -> Self {
        let mut blob = Self::with_type(TYPE_DIRECTORY);
        blob.file_name = Some(name.into());
        blob.entries = Some(entries);
        blob
    }

    pub fn static_set(members: impl IntoIterator<Item = BlobRef>) -> Self {
        let mut blob = Self::with_type(TYPE_STATIC_SET);
        blob.members = members.into_iter().collect();
        blob
    }

    pub fn file(name: impl Into<String>, parts: Vec<BlobPart>) -> Self {
        let mut blob = Self::with_type(TYPE_FILE);
        blob.file_name = Some(name.into());
        blob.parts = parts;
        blob
    }

    pub fn symlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        let mut blob = Self::with_type(TYPE_SYMLINK);
        blob.file_name = Some(name.into());
        blob.symlink_target = Some(target.into());
        blob
    }

    pub fn with_permission(mut self, mode: u32) -> Self {
        self.unix_permission = Some(format!("0{mode:o}"));
        self
    }

    pub fn with_owner(mut self, uid: u32, gid: u32) -> Self {
        self.unix_owner_id = Some(uid);
        self.unix_group_id = Some(gid);
        self
    }

    pub fn with_mtime(mut self, mtime: impl Into<String>) -> Self {
        self.unix_mtime = Some(mtime.into());
        self
    }

    pub fn is_type(&self, blob_type: &str) -> bool {
        self.blob_type == blob_type
    }

    /// Fails with [`SchemaError::UnexpectedType`] unless the blob has
    /// type `expected`.
    pub fn expect_type(&self, blob_ref: &BlobRef, expected: &'static str) -> SchemaResult<()> {
        if self.is_type(expected) {
            Ok(())
        } else {
            Err(SchemaError::UnexpectedType {
                blob_ref: blob_ref.clone(),
                expected,
                actual: self.blob_type.clone(),
            })
        }
    }

    /// Parsed `unixPermission`, if present and valid octal.
    pub fn permission(&self) -> Option<u32> {
        self.unix_permission
            .as_deref()
            .and_then(|mode| u32::from_str_radix(mode, 8).ok())
    }

    /// Total size of a file's contents.
    pub fn parts_size(&self) -> u64 {
        self.parts.iter().map(|part| part.size).sum()
    }

    /// Decodes the first JSON document in `bytes`. Trailing data after
    /// the document is ignored.
    pub fn decode(blob_ref: &BlobRef, bytes: &[u8]) -> SchemaResult<Self> {
        let mut documents = serde_json::Deserializer::from_slice(bytes).into_iter::<Self>();
        match documents.next() {
            Some(Ok(blob)) => Ok(blob),
            Some(Err(source)) => Err(SchemaError::Decode {
                blob_ref: blob_ref.clone(),
                source,
            }),
            None => Err(SchemaError::Empty {
                blob_ref: blob_ref.clone(),
            }),
        }
    }

    pub fn to_json_bytes(&self) -> serde_json::Result<Bytes> {
        Ok(serde_json::to_vec_pretty(self)?.into())
    }
}

/// Fetches the blob at `blob_ref` and decodes it as a schema document.
///
/// The fetched reader is dropped before returning, whether decoding
/// succeeds or not.
pub async fn resolve(fetcher: &dyn Fetcher, blob_ref: &BlobRef) -> SchemaResult<SchemaBlob> {
    if !blob_ref.is_valid() {
        return Err(SchemaError::InvalidRef {
            blob_ref: blob_ref.clone(),
            context: "schema blob".to_string(),
        });
    }

    let bytes = {
        let mut fetched = fetcher
            .fetch(blob_ref)
            .await
            .map_err(|source| SchemaError::Fetch {
                blob_ref: blob_ref.clone(),
                source,
            })?;
        let mut buf = Vec::with_capacity(fetched.size.min(MAX_PREALLOC) as usize);
        fetched
            .reader
            .read_to_end(&mut buf)
            .await
            .map_err(|source| SchemaError::Io {
                blob_ref: blob_ref.clone(),
                source,
            })?;
        buf
    };

    let blob = SchemaBlob::decode(blob_ref, &bytes)?;
    debug!(
        "schema: resolved {} as {:?} ({} bytes)",
        blob_ref.fmt_short(),
        blob.blob_type,
        bytes.len()
    );
    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some_ref() -> BlobRef {
        BlobRef::for_content(b"some blob")
    }

    #[test]
    fn decodes_directory() {
        let entries = some_ref();
        let json = format!(
            r#"{{"camliVersion": 1, "type": "directory", "fileName": "src", "entries": "{entries}"}}"#
        );
        let blob = SchemaBlob::decode(&some_ref(), json.as_bytes()).unwrap();
        assert!(blob.is_type(TYPE_DIRECTORY));
        assert_eq!(blob.file_name.as_deref(), Some("src"));
        assert_eq!(blob.entries, Some(entries));
    }

    #[test]
    fn accepts_legacy_type_key() {
        let blob =
            SchemaBlob::decode(&some_ref(), br#"{"camliType": "static-set", "members": []}"#)
                .unwrap();
        assert!(blob.is_type(TYPE_STATIC_SET));
        assert!(blob.members.is_empty());
    }

    #[test]
    fn keeps_member_order_and_malformed_members() {
        let a = BlobRef::for_content(b"a");
        let json = format!(r#"{{"type": "static-set", "members": ["{a}", "garbage"]}}"#);
        let blob = SchemaBlob::decode(&some_ref(), json.as_bytes()).unwrap();
        assert_eq!(blob.members.len(), 2);
        assert_eq!(blob.members[0], a);
        assert!(!blob.members[1].is_valid());
    }

    #[test]
    fn null_lists_decode_as_empty() {
        let set = SchemaBlob::decode(&some_ref(), br#"{"type": "static-set", "members": null}"#)
            .unwrap();
        assert!(set.is_type(TYPE_STATIC_SET));
        assert!(set.members.is_empty());

        let file = SchemaBlob::decode(
            &some_ref(),
            br#"{"type": "file", "fileName": "empty", "parts": null}"#,
        )
        .unwrap();
        assert!(file.parts.is_empty());
        assert_eq!(file.parts_size(), 0);
    }

    #[test]
    fn missing_type_is_decode_error() {
        let err = SchemaBlob::decode(&some_ref(), br#"{"members": []}"#).unwrap_err();
        assert!(matches!(err, SchemaError::Decode { .. }));
        assert!(err.is_decode());
    }

    #[test]
    fn not_json_is_decode_error() {
        let err = SchemaBlob::decode(&some_ref(), b"\x00\x01binary").unwrap_err();
        assert!(matches!(err, SchemaError::Decode { .. }));
    }

    #[test]
    fn empty_blob_is_rejected() {
        let err = SchemaBlob::decode(&some_ref(), b"  \n").unwrap_err();
        assert!(matches!(err, SchemaError::Empty { .. }));
    }

    #[test]
    fn trailing_data_is_ignored() {
        let blob =
            SchemaBlob::decode(&some_ref(), br#"{"type": "symlink"} trailing"#).unwrap();
        assert!(blob.is_type(TYPE_SYMLINK));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let blob = SchemaBlob::decode(
            &some_ref(),
            br#"{"type": "file", "fileName": "a", "claimDate": "2011-01-01"}"#,
        )
        .unwrap();
        assert!(blob.is_type(TYPE_FILE));
    }

    #[test]
    fn builder_output_decodes_back() {
        let part = BlobPart::new(some_ref(), 10);
        let file = SchemaBlob::file("notes.txt", vec![part.clone(), BlobPart::new(some_ref(), 5)])
            .with_permission(0o644)
            .with_owner(1000, 1000)
            .with_mtime("2011-07-04T10:00:00Z");
        let bytes = file.to_json_bytes().unwrap();
        let decoded = SchemaBlob::decode(&some_ref(), &bytes).unwrap();
        assert_eq!(decoded, file);
        assert_eq!(decoded.unix_permission.as_deref(), Some("0644"));
        assert_eq!(decoded.permission(), Some(0o644));
        assert_eq!(decoded.parts_size(), 15);
    }

    #[test]
    fn builders_write_the_type_key() {
        let bytes = SchemaBlob::static_set(vec![some_ref()])
            .to_json_bytes()
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "static-set");
        assert_eq!(value["camliVersion"], 1);
        assert_eq!(value["members"][0], some_ref().as_str());
    }

    #[test]
    fn expect_type_reports_both_types() {
        let blob = SchemaBlob::static_set(Vec::new());
        let err = blob.expect_type(&some_ref(), TYPE_DIRECTORY).unwrap_err();
        match err {
            SchemaError::UnexpectedType {
                expected, actual, ..
            } => {
                assert_eq!(expected, TYPE_DIRECTORY);
                assert_eq!(actual, TYPE_STATIC_SET);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
