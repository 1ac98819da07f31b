use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::WatchConfig;
use crate::core::uploader::{UploadError, UploadReport};

mod fs;
mod simulated;

pub use fs::FsAdapter;
pub use simulated::{SimulatedAdapter, SimulatedMount};

/// Access to the watched mount point. One implementation talks to the real
/// filesystem, the other is an in-memory stand-in for tests and dry runs.
#[async_trait]
pub trait MountAdapter: Send + Sync {
    /// Presence probe of the mount root. Any error here means "not yet
    /// ready", never a failure.
    async fn is_present(&self) -> bool;

    /// Copy `source` onto the mount as `firmware.uf2`.
    async fn upload(&self, source: &Path) -> Result<UploadReport, UploadError>;
}

pub fn get_adapter(simulation: bool, config: &WatchConfig) -> Arc<dyn MountAdapter> {
    if simulation {
        let (adapter, mount) = SimulatedAdapter::new();

        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lines() {
                let Ok(cmd) = line else { break };
                let parts: Vec<&str> = cmd.trim().split_whitespace().collect();
                match parts.first().copied() {
                    Some("insert") => mount.insert(),
                    Some("rm") => mount.remove(),
                    Some("fail") => {
                        let n = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(1);
                        mount.fail_uploads(n);
                    }
                    _ => println!("(simulator) use: 'insert', 'rm' or 'fail <n>'"),
                }
            }
        });

        return Arc::new(adapter);
    }

    Arc::new(FsAdapter::new(config.mount_path.clone()))
}
