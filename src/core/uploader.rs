//! Upload outcome types shared by the mount adapters and the poller.

use chrono::{DateTime, Local};

/// Name the image is written as on the bootloader drive. UF2 bootloaders
/// accept any `.uf2` file dropped at the mount root.
pub const IMAGE_NAME: &str = "firmware.uf2";

/// A single upload failure. There is exactly one error kind: the underlying
/// copy primitive failed (destination unwritable, source missing, device
/// yanked mid-write). Absence of the mount is not an error, it is the normal
/// "not yet ready" signal handled by the poller.
#[derive(Debug, thiserror::Error)]
#[error("failed to upload firmware: {source}")]
pub struct UploadError {
    #[from]
    pub source: std::io::Error,
}

/// A completed upload.
#[derive(Debug, Clone)]
pub struct UploadReport {
    /// Bytes written to the destination.
    pub bytes: u64,
    /// Wall-clock completion time, logged as `%H:%M:%S`.
    pub at: DateTime<Local>,
}

impl UploadReport {
    pub fn now(bytes: u64) -> Self {
        Self {
            bytes,
            at: Local::now(),
        }
    }
}
