use std::path::PathBuf;
use std::time::Duration;

/// Default source image produced by a PlatformIO pico build.
pub const DEFAULT_FIRMWARE_PATH: &str = ".pio/build/pico/firmware.uf2";

/// How often the mount point is checked for.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Suppression window after any detection before the next check.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(5000);

/// Re-arm delay after a failed upload.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Immutable process-wide configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Mount root to watch for (e.g. `/media/user/RPI-RP2`).
    pub mount_path: PathBuf,
    /// Firmware image copied onto the mount as `firmware.uf2`.
    pub firmware_path: PathBuf,
    pub poll_interval: Duration,
    pub cooldown: Duration,
    pub retry_delay: Duration,
}

impl WatchConfig {
    pub fn new(mount_path: impl Into<PathBuf>) -> Self {
        Self {
            mount_path: mount_path.into(),
            firmware_path: PathBuf::from(DEFAULT_FIRMWARE_PATH),
            poll_interval: DEFAULT_POLL_INTERVAL,
            cooldown: DEFAULT_COOLDOWN,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}
