use std::sync::Arc;

use blobdir_core::{BlobRef, BlobWriter};
use blobdir_schema::{
    BlobPart, DirReader, ReaderConfig, SchemaBlob, debug::render_tree,
};
use blobdir_store_local::LocalStore;
use blobdir_store_memory::MemoryStore;
use tempfile::tempdir;

async fn put(store: &impl BlobWriter, blob: &SchemaBlob) -> anyhow::Result<BlobRef> {
    store.put_bytes(blob.to_json_bytes()?).await
}

#[tokio::test(flavor = "multi_thread")]
async fn renders_nested_directories_from_local_store() -> anyhow::Result<()> {
    let tmp = tempdir()?;
    let store = LocalStore::new(tmp.path());

    let content = store.put_bytes("hello\n".into()).await?;
    let hello = put(&store, &SchemaBlob::file("hello.txt", vec![BlobPart::new(content, 6)])).await?;
    let link = put(&store, &SchemaBlob::symlink("greeting", "hello.txt")).await?;
    let inner_set = put(&store, &SchemaBlob::static_set(vec![hello.clone(), link])).await?;
    let docs = put(&store, &SchemaBlob::directory("docs", inner_set)).await?;
    let root_set = put(&store, &SchemaBlob::static_set(vec![docs, hello])).await?;
    let root = put(&store, &SchemaBlob::directory("root", root_set)).await?;

    let tree = render_tree(Arc::new(store), &root, ReaderConfig::default()).await?;
    let lines: Vec<&str> = tree.lines().collect();

    assert_eq!(lines.len(), 5, "tree:\n{tree}");
    assert!(lines[0].starts_with("root [directory members=2"));
    assert!(lines[1].starts_with("├── docs/ [ref="));
    assert!(lines[2].starts_with("│   ├── hello.txt [file size=6"));
    assert_eq!(lines[3], "│   └── greeting -> hello.txt");
    assert!(lines[4].starts_with("└── hello.txt [file size=6"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn broken_subdirectory_is_reported_inline() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let missing_set = BlobRef::for_content(b"missing static-set");
    let broken = put(store.as_ref(), &SchemaBlob::directory("broken", missing_set)).await?;
    let root_set = put(store.as_ref(), &SchemaBlob::static_set(vec![broken])).await?;
    let root = put(store.as_ref(), &SchemaBlob::directory("root", root_set)).await?;

    let tree = render_tree(store.clone(), &root, ReaderConfig::default()).await?;
    assert!(tree.contains("└── broken/"), "tree:\n{tree}");
    assert!(tree.contains("[BROKEN SUBTREE at broken:"), "tree:\n{tree}");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn cycles_are_cut() -> anyhow::Result<()> {
    // Content addressing rules out real cycles, so plant one by hand.
    let store = Arc::new(MemoryStore::new());
    let dir_ref = BlobRef::for_content(b"self-referencing dir");
    let set_ref = put(store.as_ref(), &SchemaBlob::static_set(vec![dir_ref.clone()])).await?;
    store.put_at(
        dir_ref.clone(),
        SchemaBlob::directory("loop", set_ref).to_json_bytes()?,
    );

    let tree = render_tree(store.clone(), &dir_ref, ReaderConfig::unbounded()).await?;
    assert!(tree.contains("[CYCLE back to"), "tree:\n{tree}");
    Ok(())
}

#[tokio::test]
async fn root_failure_is_an_error() {
    let store = Arc::new(MemoryStore::new());
    let file = put(store.as_ref(), &SchemaBlob::file("f", Vec::new()))
        .await
        .unwrap();
    assert!(render_tree(store.clone(), &file, ReaderConfig::default())
        .await
        .is_err());
    assert!(DirReader::new(store, &file).await.is_err());
}
