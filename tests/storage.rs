use ladeno_storefront::{
    error::AppError,
    storage::{ObjectStore, UploadProgress},
};
use tokio::sync::watch;
use uuid::Uuid;

fn temp_store() -> ObjectStore {
    let root = std::env::temp_dir().join(format!("ladeno-storage-{}", Uuid::new_v4()));
    ObjectStore::new(root, "http://localhost:3000/files/")
}

#[tokio::test]
async fn put_reports_progress_to_completion() -> anyhow::Result<()> {
    let store = temp_store();
    let bytes: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let (sender, receiver) = watch::channel(UploadProgress::default());

    let stored = store.put("product/abc/photo.png", &bytes, Some(&sender)).await?;

    let progress = *receiver.borrow();
    assert!(progress.is_complete());
    assert_eq!(progress.percent(), 100.0);
    assert_eq!(progress.total_bytes, bytes.len() as u64);
    assert_eq!(stored.bytes, bytes.len() as u64);
    assert_eq!(stored.url, "http://localhost:3000/files/product/abc/photo.png");

    let on_disk = tokio::fs::read(store.path_for(&stored.key)?).await?;
    assert_eq!(on_disk, bytes);

    tokio::fs::remove_dir_all(store.root()).await?;
    Ok(())
}

#[tokio::test]
async fn interrupted_upload_resumes_from_part_file() -> anyhow::Result<()> {
    let store = temp_store();
    let bytes = b"0123456789abcdef".to_vec();
    let path = store.path_for("brand/u/logo.png")?;
    tokio::fs::create_dir_all(path.parent().expect("parent")).await?;
    tokio::fs::write(path.with_file_name("logo.png.part"), &bytes[..6]).await?;

    let (sender, receiver) = watch::channel(UploadProgress::default());
    store.put("brand/u/logo.png", &bytes, Some(&sender)).await?;

    assert!(receiver.borrow().is_complete());
    assert_eq!(tokio::fs::read(&path).await?, bytes);
    assert!(!path.with_file_name("logo.png.part").exists());

    tokio::fs::remove_dir_all(store.root()).await?;
    Ok(())
}

#[tokio::test]
async fn unrelated_part_file_is_discarded() -> anyhow::Result<()> {
    let store = temp_store();
    let path = store.path_for("product/p/shot.png")?;
    tokio::fs::create_dir_all(path.parent().expect("parent")).await?;
    tokio::fs::write(path.with_file_name("shot.png.part"), b"JUNKJUNK").await?;

    store.put("product/p/shot.png", b"GOOD-IMAGE-BYTES", None).await?;

    assert_eq!(tokio::fs::read(&path).await?, b"GOOD-IMAGE-BYTES");
    assert!(!path.with_file_name("shot.png.part").exists());

    tokio::fs::remove_dir_all(store.root()).await?;
    Ok(())
}

#[tokio::test]
async fn discard_removes_orphaned_upload() -> anyhow::Result<()> {
    let store = temp_store();
    let stored = store.put("brand/o/logo.png", b"png", None).await?;
    let path = store.path_for(&stored.key)?;
    assert!(path.exists());

    store.discard(&stored.key).await;
    assert!(!path.exists());
    // already gone: logged, not an error
    store.discard(&stored.key).await;

    tokio::fs::remove_dir_all(store.root()).await?;
    Ok(())
}

#[tokio::test]
async fn put_logged_stores_object() -> anyhow::Result<()> {
    let store = temp_store();
    let stored = store.put_logged("product/x/a.jpg", b"jpeg").await?;
    assert_eq!(stored.url, store.url_for("product/x/a.jpg"));

    store.delete(&stored.key).await?;
    assert!(matches!(store.delete(&stored.key).await, Err(AppError::NotFound)));

    tokio::fs::remove_dir_all(store.root()).await?;
    Ok(())
}

#[test]
fn keys_cannot_escape_the_root() {
    let store = temp_store();
    assert!(store.path_for("../etc/passwd").is_err());
    assert!(store.path_for("/etc/passwd").is_err());
    assert!(store.path_for("").is_err());
    assert!(store.path_for("product/a/b.png").is_ok());
}

#[test]
fn object_keys_are_sanitized() {
    let owner = Uuid::new_v4();
    let key = ObjectStore::object_key("brand", owner, "../My Logo (1).png");
    let prefix = format!("brand/{owner}/");
    assert!(key.starts_with(&prefix), "{key}");
    let name = &key[prefix.len()..];
    assert_eq!(name.len(), 9 + "My_Logo__1_.png".len());
    assert!(name.ends_with("-My_Logo__1_.png"), "{name}");

    let key = ObjectStore::object_key("product", owner, "");
    assert!(key.ends_with("-file"));
}

#[test]
fn empty_upload_is_complete() {
    let progress = UploadProgress::default();
    assert_eq!(progress.percent(), 100.0);
    assert!(progress.is_complete());
}
