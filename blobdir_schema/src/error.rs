use blobdir_core::BlobRef;

/// Crate-wide result alias.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while resolving schema blobs and listing directories.
///
/// Every variant carries the reference it concerns.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid blobref {blob_ref:?} ({context})")]
    InvalidRef { blob_ref: BlobRef, context: String },

    #[error("fetching schema blob {blob_ref}: {source:#}")]
    Fetch {
        blob_ref: BlobRef,
        #[source]
        source: anyhow::Error,
    },

    #[error("reading schema blob {blob_ref}: {source}")]
    Io {
        blob_ref: BlobRef,
        #[source]
        source: std::io::Error,
    },

    #[error("decoding schema blob {blob_ref}: {source}")]
    Decode {
        blob_ref: BlobRef,
        #[source]
        source: serde_json::Error,
    },

    #[error("schema blob {blob_ref} is empty")]
    Empty { blob_ref: BlobRef },

    #[error("schema blob {blob_ref} ({blob_type}) lacks field {field:?}")]
    MissingField {
        blob_ref: BlobRef,
        blob_type: String,
        field: &'static str,
    },

    #[error("expected {expected:?} schema blob for {blob_ref}, got {actual:?}")]
    UnexpectedType {
        blob_ref: BlobRef,
        expected: &'static str,
        actual: String,
    },

    #[error("can't create directory entry #{index} from {blob_ref}: {source}")]
    EntryResolution {
        index: usize,
        blob_ref: BlobRef,
        #[source]
        source: Box<SchemaError>,
    },

    #[error("entry task for {blob_ref} ended without reporting")]
    TaskAborted { blob_ref: BlobRef },
}

impl SchemaError {
    /// The reference the error concerns.
    pub fn blob_ref(&self) -> &BlobRef {
        match self {
            Self::InvalidRef { blob_ref, .. }
            | Self::Fetch { blob_ref, .. }
            | Self::Io { blob_ref, .. }
            | Self::Decode { blob_ref, .. }
            | Self::Empty { blob_ref }
            | Self::MissingField { blob_ref, .. }
            | Self::UnexpectedType { blob_ref, .. }
            | Self::EntryResolution { blob_ref, .. }
            | Self::TaskAborted { blob_ref } => blob_ref,
        }
    }

    /// True for decode-class failures: bytes that are not a well-formed
    /// schema document of the expected shape.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Empty { .. } | Self::MissingField { .. }
        )
    }
}
