//! Filesystem adapter tests against real temp directories.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use uf2d::adapters::{FsAdapter, MountAdapter};
use uf2d::config::WatchConfig;
use uf2d::core::{Poller, PollerEvent};

#[tokio::test]
async fn upload_copies_image_to_mount_root() {
    let mount = tempfile::tempdir().unwrap();
    let build = tempfile::tempdir().unwrap();
    let source = build.path().join("firmware.uf2");
    std::fs::write(&source, b"UF2\nfake image contents").unwrap();

    let adapter = FsAdapter::new(mount.path().to_path_buf());
    assert!(adapter.is_present().await);

    let report = adapter.upload(&source).await.unwrap();
    assert_eq!(report.bytes, 23);

    let copied = std::fs::read(mount.path().join("firmware.uf2")).unwrap();
    assert_eq!(copied, b"UF2\nfake image contents");
}

#[tokio::test]
async fn missing_mount_reads_as_absent() {
    let parent = tempfile::tempdir().unwrap();
    let adapter = FsAdapter::new(parent.path().join("RPI-RP2"));
    assert!(!adapter.is_present().await);
}

#[tokio::test]
async fn upload_to_missing_mount_fails() {
    let parent = tempfile::tempdir().unwrap();
    let build = tempfile::tempdir().unwrap();
    let source = build.path().join("firmware.uf2");
    std::fs::write(&source, b"image").unwrap();

    let adapter = FsAdapter::new(parent.path().join("RPI-RP2"));
    let err = adapter.upload(&source).await.unwrap_err();
    assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
}

#[tokio::test]
async fn upload_with_missing_source_fails() {
    let mount = tempfile::tempdir().unwrap();
    let adapter = FsAdapter::new(mount.path().to_path_buf());

    let err = adapter
        .upload(std::path::Path::new("/nonexistent/firmware.uf2"))
        .await
        .unwrap_err();
    assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
}

/// End to end: the watcher sees the mount directory appear and drops the
/// image into it.
#[tokio::test]
async fn watch_uploads_when_mount_directory_appears() {
    let parent = tempfile::tempdir().unwrap();
    let build = tempfile::tempdir().unwrap();
    let source = build.path().join("firmware.uf2");
    std::fs::write(&source, b"image bytes").unwrap();

    let mount_path = parent.path().join("RPI-RP2");
    let config = WatchConfig {
        mount_path: mount_path.clone(),
        firmware_path: source,
        poll_interval: Duration::from_millis(10),
        cooldown: Duration::from_millis(500),
        retry_delay: Duration::from_millis(100),
    };

    let adapter = Arc::new(FsAdapter::new(mount_path.clone()));
    let (tx, mut events) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    tokio::spawn(
        Poller::new(config, adapter)
            .with_events(tx)
            .run(cancel.clone()),
    );

    // Let a few absent polls go by, then "mount" the drive.
    tokio::time::sleep(Duration::from_millis(50)).await;
    std::fs::create_dir(&mount_path).unwrap();

    let mut uploaded = false;
    while let Ok(Some(event)) = timeout(Duration::from_secs(2), events.recv()).await {
        if let PollerEvent::Uploaded(report) = event {
            assert_eq!(report.bytes, 11);
            uploaded = true;
            break;
        }
    }
    assert!(uploaded, "expected an upload after the mount appeared");

    let copied = std::fs::read(mount_path.join("firmware.uf2")).unwrap();
    assert_eq!(copied, b"image bytes");

    cancel.cancel();
}
