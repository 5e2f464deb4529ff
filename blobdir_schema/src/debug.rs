use std::{fmt::Write, sync::Arc};

use blobdir_core::{BlobRef, Fetcher};

use crate::{DirReader, DirectoryEntry, ReaderConfig, SchemaResult};

/// Print a debug tree of the directory blob `root` and everything below it.
pub async fn print_tree(
    fetcher: Arc<dyn Fetcher>,
    root: &BlobRef,
    config: ReaderConfig,
) -> SchemaResult<()> {
    let rendered = render_tree(fetcher, root, config).await?;
    print!("{rendered}");
    Ok(())
}

/// Render the tree below `root` as text.
///
/// Failure to read `root` itself is an error; subdirectories that fail
/// to load are reported inline and skipped.
pub async fn render_tree(
    fetcher: Arc<dyn Fetcher>,
    root: &BlobRef,
    config: ReaderConfig,
) -> SchemaResult<String> {
    let mut reader = DirReader::new(fetcher.clone(), root)
        .await?
        .with_config(config);
    let entries = reader.read_all().await?;

    let mut out = String::new();
    let name = reader.schema().file_name.as_deref().unwrap_or(".");
    let _ = writeln!(
        out,
        "{} [directory members={} ref={}]",
        name,
        entries.len(),
        root.fmt_short()
    );

    let mut stack: Vec<Frame> = vec![Frame {
        dir_ref: root.clone(),
        prefix: String::new(),
        entries,
        index: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        if frame.index >= frame.entries.len() {
            stack.pop();
            continue;
        }

        let entry = frame.entries[frame.index].clone();
        let is_last = frame.index + 1 == frame.entries.len();
        frame.index += 1;

        let (branch, child_prefix_piece) = if is_last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let child_prefix = format!("{}{}", frame.prefix, child_prefix_piece);
        let _ = write!(out, "{}{}", frame.prefix, branch);

        match &entry {
            DirectoryEntry::File(file) => {
                let _ = writeln!(
                    out,
                    "{} [file size={} ref={}]",
                    file.name,
                    file.size,
                    file.blob_ref.fmt_short()
                );
            }
            DirectoryEntry::Symlink(link) => {
                let _ = writeln!(out, "{} -> {}", link.name, link.target);
            }
            DirectoryEntry::Other(other) => {
                let _ = writeln!(
                    out,
                    "{} [{} ref={}]",
                    entry.name(),
                    other.blob_type,
                    other.blob_ref.fmt_short()
                );
            }
            DirectoryEntry::Directory(dir) => {
                let _ = writeln!(out, "{}/ [ref={}]", dir.name, dir.blob_ref.fmt_short());

                if stack.iter().any(|f| f.dir_ref == dir.blob_ref) {
                    let _ = writeln!(out, "{}[CYCLE back to {}]", child_prefix, dir.blob_ref);
                    continue;
                }

                match read_subdir(fetcher.clone(), &dir.blob_ref, config).await {
                    Ok(entries) => stack.push(Frame {
                        dir_ref: dir.blob_ref.clone(),
                        prefix: child_prefix,
                        entries,
                        index: 0,
                    }),
                    Err(err) => {
                        let _ = writeln!(
                            out,
                            "{}[BROKEN SUBTREE at {}: {}]",
                            child_prefix, dir.name, err
                        );
                    }
                }
            }
        }
    }

    Ok(out)
}

struct Frame {
    dir_ref: BlobRef,
    prefix: String,
    entries: Vec<DirectoryEntry>,
    index: usize,
}

async fn read_subdir(
    fetcher: Arc<dyn Fetcher>,
    dir_ref: &BlobRef,
    config: ReaderConfig,
) -> SchemaResult<Vec<DirectoryEntry>> {
    let mut reader = DirReader::new(fetcher, dir_ref).await?.with_config(config);
    reader.read_all().await
}
