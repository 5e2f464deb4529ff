//! Reading the members of a `directory` schema blob.
//!
//! A directory blob does not list its members itself: its `entries`
//! field points at a `static-set` blob whose `members` are the entry
//! blobs, in listing order. [`DirReader`] resolves that indirection on
//! first use and then materializes pages of entries concurrently.

use std::sync::Arc;

use blobdir_core::{BlobRef, Fetcher};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::{
    ReaderConfig, SchemaError, SchemaResult,
    entry::{DirectoryEntry, EntryResolver, SchemaEntryResolver},
    schema::{self, SchemaBlob, TYPE_DIRECTORY, TYPE_STATIC_SET},
    spawn::spawn_reporting,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Members remain after this page.
    More,
    /// The page reached the end of the directory.
    End,
}

/// One page of entries returned by [`DirReader::readdir`].
#[derive(Debug, Clone)]
pub struct ReaddirPage {
    pub entries: Vec<DirectoryEntry>,
    pub status: ReadStatus,
}

impl ReaddirPage {
    pub fn is_end(&self) -> bool {
        self.status == ReadStatus::End
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<DirectoryEntry> {
        self.entries
    }
}

/// Reads the entries of one directory blob.
///
/// Not meant for concurrent use: `readdir` and `static_set` take
/// `&mut self`.
pub struct DirReader {
    fetcher: Arc<dyn Fetcher>,
    resolver: Arc<dyn EntryResolver>,
    blob_ref: BlobRef,
    schema: SchemaBlob,
    static_set: Option<Arc<[BlobRef]>>,
    current: usize,
    gate: Option<Arc<Semaphore>>,
}

impl DirReader {
    /// Fetches `dir_ref` and prepares to read its entries. The static-set
    /// is not fetched until first needed.
    pub async fn new(fetcher: Arc<dyn Fetcher>, dir_ref: &BlobRef) -> SchemaResult<Self> {
        let schema = schema::resolve(fetcher.as_ref(), dir_ref).await?;
        Self::from_schema(fetcher, dir_ref.clone(), schema)
    }

    /// Wraps an already decoded directory blob.
    pub fn from_schema(
        fetcher: Arc<dyn Fetcher>,
        dir_ref: BlobRef,
        schema: SchemaBlob,
    ) -> SchemaResult<Self> {
        schema.expect_type(&dir_ref, TYPE_DIRECTORY)?;
        Ok(Self {
            fetcher,
            resolver: Arc::new(SchemaEntryResolver),
            blob_ref: dir_ref,
            schema,
            static_set: None,
            current: 0,
            gate: gate_for(&ReaderConfig::default()),
        })
    }

    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.gate = gate_for(&config);
        self
    }

    /// Replaces the per-member resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn EntryResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn blob_ref(&self) -> &BlobRef {
        &self.blob_ref
    }

    pub fn schema(&self) -> &SchemaBlob {
        &self.schema
    }

    /// Offset of the next member `readdir(n > 0)` will return.
    pub fn cursor(&self) -> usize {
        self.current
    }

    /// Number of members, once the static-set has been resolved.
    pub fn len(&self) -> Option<usize> {
        self.static_set.as_ref().map(|set| set.len())
    }

    /// Returns the members of the directory's static-set, fetching it on
    /// the first call. A failed resolution caches nothing.
    pub async fn static_set(&mut self) -> SchemaResult<Arc<[BlobRef]>> {
        if let Some(set) = &self.static_set {
            return Ok(set.clone());
        }

        let set_ref = self
            .schema
            .entries
            .clone()
            .unwrap_or_else(|| BlobRef::from_unchecked(""));
        if !set_ref.is_valid() {
            return Err(SchemaError::InvalidRef {
                blob_ref: set_ref,
                context: format!("entries of directory {}", self.blob_ref),
            });
        }

        let set = schema::resolve(self.fetcher.as_ref(), &set_ref).await?;
        set.expect_type(&set_ref, TYPE_STATIC_SET)?;
        if let Some((index, member)) = set
            .members
            .iter()
            .enumerate()
            .find(|(_, member)| !member.is_valid())
        {
            return Err(SchemaError::InvalidRef {
                blob_ref: member.clone(),
                context: format!("member #{index} of static-set {set_ref}"),
            });
        }

        debug!(
            "dir_reader: {} has {} members",
            self.blob_ref.fmt_short(),
            set.members.len()
        );
        let members: Arc<[BlobRef]> = set.members.into();
        self.static_set = Some(members.clone());
        Ok(members)
    }

    /// Returns the next page of entries.
    ///
    /// With `n > 0`, resolves up to `n` members starting at the cursor
    /// and advances the cursor past them. With `n <= 0`, rewinds the
    /// cursor and resolves every member.
    ///
    /// All members of the page are resolved concurrently and returned in
    /// static-set order. If any member fails, no entries are returned.
    pub async fn readdir(&mut self, n: isize) -> SchemaResult<ReaddirPage> {
        let members = self.static_set().await?;
        let len = members.len();

        let (start, up) = if n <= 0 {
            self.current = 0;
            (0, len)
        } else {
            let start = self.current.min(len);
            (start, start.saturating_add(n.unsigned_abs()).min(len))
        };
        let status = if up >= len {
            ReadStatus::End
        } else {
            ReadStatus::More
        };

        let entries = self.resolve_range(&members[start..up], start).await?;
        self.current = up;
        Ok(ReaddirPage { entries, status })
    }

    /// Resolves every member.
    pub async fn read_all(&mut self) -> SchemaResult<Vec<DirectoryEntry>> {
        Ok(self.readdir(0).await?.entries)
    }

    async fn resolve_range(
        &self,
        members: &[BlobRef],
        offset: usize,
    ) -> SchemaResult<Vec<DirectoryEntry>> {
        debug!(
            "dir_reader: resolving {} entries of {} from #{}",
            members.len(),
            self.blob_ref.fmt_short(),
            offset
        );

        // Kick off all entry loads before waiting on any of them.
        let pending: Vec<_> = members
            .iter()
            .map(|member| {
                let fetcher = self.fetcher.clone();
                let resolver = self.resolver.clone();
                let gate = self.gate.clone();
                let member = member.clone();
                spawn_reporting(async move {
                    let _permit = match gate {
                        Some(gate) => gate.acquire_owned().await.ok(),
                        None => None,
                    };
                    resolver.resolve_entry(fetcher.as_ref(), &member).await
                })
            })
            .collect();

        let mut entries = Vec::with_capacity(members.len());
        for (index, (rx, member)) in pending.into_iter().zip(members).enumerate() {
            let index = offset + index;
            let source = match rx.await {
                Ok(Ok(entry)) => {
                    entries.push(entry);
                    continue;
                }
                Ok(Err(err)) => err,
                Err(_) => SchemaError::TaskAborted {
                    blob_ref: member.clone(),
                },
            };
            warn!(
                "dir_reader: entry #{} ({}) of {} failed: {}",
                index,
                member.fmt_short(),
                self.blob_ref.fmt_short(),
                source
            );
            return Err(SchemaError::EntryResolution {
                index,
                blob_ref: member.clone(),
                source: Box::new(source),
            });
        }
        Ok(entries)
    }
}

impl std::fmt::Debug for DirReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirReader")
            .field("blob_ref", &self.blob_ref)
            .field("members", &self.len())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// Values above what a semaphore can hold are clamped to that limit.
fn gate_for(config: &ReaderConfig) -> Option<Arc<Semaphore>> {
    let permits = config.max_concurrent_fetches.min(Semaphore::MAX_PERMITS);
    (permits > 0).then(|| Arc::new(Semaphore::new(permits)))
}
