use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::MountAdapter;
use crate::core::uploader::{UploadError, UploadReport};

/// Size reported for a simulated upload. Real UF2 images for the pico land
/// in the hundreds of kilobytes.
const SIMULATED_IMAGE_BYTES: u64 = 256 * 1024;

struct Inner {
    present: AtomicBool,
    /// Injected failures remaining; each upload attempt consumes one.
    failures: AtomicU32,
    attempts: AtomicUsize,
    uploaded: Mutex<Vec<PathBuf>>,
    /// How long an upload takes. Presence is re-checked after the delay so a
    /// removal mid-copy fails the way a yanked device does.
    upload_delay: Mutex<Duration>,
}

/// Controller handle for driving the simulated mount from tests or from the
/// interactive simulator prompt.
#[derive(Clone)]
pub struct SimulatedMount {
    inner: Arc<Inner>,
}

impl SimulatedMount {
    /// Make the mount point appear.
    pub fn insert(&self) {
        self.inner.present.store(true, Ordering::SeqCst);
    }

    /// Make the mount point disappear.
    pub fn remove(&self) {
        self.inner.present.store(false, Ordering::SeqCst);
    }

    /// Fail the next `n` upload attempts with an injected I/O error.
    pub fn fail_uploads(&self, n: u32) {
        self.inner.failures.store(n, Ordering::SeqCst);
    }

    /// Make uploads take this long instead of completing instantly.
    pub fn set_upload_delay(&self, delay: Duration) {
        *self.inner.upload_delay.lock().unwrap() = delay;
    }

    /// Total upload attempts, successful or not.
    pub fn attempt_count(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Source paths of successful uploads, in order.
    pub fn uploaded(&self) -> Vec<PathBuf> {
        self.inner.uploaded.lock().unwrap().clone()
    }
}

/// In-memory mount. Starts absent; the paired [`SimulatedMount`] injects
/// insertions, removals and upload failures.
pub struct SimulatedAdapter {
    inner: Arc<Inner>,
}

impl SimulatedAdapter {
    pub fn new() -> (Self, SimulatedMount) {
        let inner = Arc::new(Inner {
            present: AtomicBool::new(false),
            failures: AtomicU32::new(0),
            attempts: AtomicUsize::new(0),
            uploaded: Mutex::new(Vec::new()),
            upload_delay: Mutex::new(Duration::ZERO),
        });

        (
            Self {
                inner: inner.clone(),
            },
            SimulatedMount { inner },
        )
    }
}

#[async_trait]
impl MountAdapter for SimulatedAdapter {
    async fn is_present(&self) -> bool {
        self.inner.present.load(Ordering::SeqCst)
    }

    async fn upload(&self, source: &Path) -> Result<UploadReport, UploadError> {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);

        let delay = *self.inner.upload_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        // Mount yanked between the presence check and the copy.
        if !self.inner.present.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "mount removed").into());
        }

        let remaining = self.inner.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.inner.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(io::Error::other("injected write failure").into());
        }

        self.inner.uploaded.lock().unwrap().push(source.to_path_buf());
        Ok(UploadReport::now(SIMULATED_IMAGE_BYTES))
    }
}
