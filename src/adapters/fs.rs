use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::MountAdapter;
use crate::core::uploader::{IMAGE_NAME, UploadError, UploadReport};

/// Talks to the real filesystem: the mount root is a directory that appears
/// when the bootloader drive is mounted.
pub struct FsAdapter {
    mount_path: PathBuf,
}

impl FsAdapter {
    pub fn new(mount_path: PathBuf) -> Self {
        Self { mount_path }
    }
}

#[async_trait]
impl MountAdapter for FsAdapter {
    async fn is_present(&self) -> bool {
        // A probe error (permissions, transient unmount) reads as absent.
        tokio::fs::try_exists(&self.mount_path).await.unwrap_or(false)
    }

    async fn upload(&self, source: &Path) -> Result<UploadReport, UploadError> {
        let destination = self.mount_path.join(IMAGE_NAME);
        debug!(
            source = %source.display(),
            destination = %destination.display(),
            "copying firmware image"
        );
        let bytes = tokio::fs::copy(source, &destination).await?;
        Ok(UploadReport::now(bytes))
    }
}
