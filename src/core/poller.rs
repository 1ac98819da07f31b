//! The watch loop: poll for the mount, upload once per presence episode,
//! suppress re-checks for a cooldown window, retry on failure.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::adapters::MountAdapter;
use crate::config::WatchConfig;
use crate::core::uploader::UploadReport;
use crate::logging::LogThrottle;

/// How often the "still waiting" debug line may be emitted while polling.
const WAITING_LOG_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// The next tick performs a presence check.
    Armed,
    /// A detection happened; checks are suppressed until a re-arm timer fires.
    Suppressed,
}

/// Emitted on the optional event channel so callers (and tests) can observe
/// the loop without scraping logs.
#[derive(Debug, Clone)]
pub enum PollerEvent {
    Detected,
    Uploaded(UploadReport),
    UploadFailed { error: String },
    Rearmed,
}

pub struct Poller {
    config: WatchConfig,
    adapter: Arc<dyn MountAdapter>,
    state: PollState,
    events: Option<mpsc::UnboundedSender<PollerEvent>>,
}

impl Poller {
    pub fn new(config: WatchConfig, adapter: Arc<dyn MountAdapter>) -> Self {
        Self {
            config,
            adapter,
            state: PollState::Armed,
            events: None,
        }
    }

    /// Attach an event channel. Send failures are ignored; a dropped receiver
    /// must not stall the loop.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<PollerEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Drive the loop until `cancel` fires. Never exits on its own otherwise.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            mount = %self.config.mount_path.display(),
            "waiting for drive to appear"
        );

        let (rearm_tx, mut rearm_rx) = mpsc::unbounded_channel();
        let mut ticker = time::interval(self.config.poll_interval);
        // A tick delayed behind a slow upload would be a no-op anyway.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let waiting = LogThrottle::new(WAITING_LOG_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("watch loop cancelled");
                    break;
                }
                Some(()) = rearm_rx.recv() => self.rearm(),
                _ = ticker.tick() => self.tick(&rearm_tx, &waiting).await,
            }
        }
    }

    async fn tick(&mut self, rearm_tx: &mpsc::UnboundedSender<()>, waiting: &LogThrottle) {
        if self.state != PollState::Armed {
            return;
        }

        if !self.adapter.is_present().await {
            if waiting.should_log() {
                debug!(mount = %self.config.mount_path.display(), "drive not present yet");
            }
            return;
        }

        self.state = PollState::Suppressed;
        info!(mount = %self.config.mount_path.display(), "drive detected");
        self.emit(PollerEvent::Detected);

        // The cooldown re-arm is scheduled at detection, before the upload
        // outcome is known. A failed upload schedules a second re-arm below;
        // the two race and whichever fires first wins, the other being an
        // idempotent no-op. After a failure the effective suppression is
        // therefore min(cooldown from detection, retry_delay from failure).
        schedule_rearm(rearm_tx, self.config.cooldown);

        match self.adapter.upload(&self.config.firmware_path).await {
            Ok(report) => {
                info!(
                    bytes = report.bytes,
                    at = %report.at.format("%H:%M:%S"),
                    "firmware uploaded"
                );
                self.emit(PollerEvent::Uploaded(report));
            }
            Err(e) => {
                error!(error = %e, "upload failed");
                info!(
                    retry_in_secs = self.config.retry_delay.as_secs_f64(),
                    "will retry"
                );
                schedule_rearm(rearm_tx, self.config.retry_delay);
                self.emit(PollerEvent::UploadFailed {
                    error: e.to_string(),
                });
            }
        }
    }

    fn rearm(&mut self) {
        // Both pending re-arm timers may deliver; only the first transitions.
        if self.state == PollState::Suppressed {
            self.state = PollState::Armed;
            debug!("re-armed, resuming presence checks");
            self.emit(PollerEvent::Rearmed);
        }
    }

    fn emit(&self, event: PollerEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

fn schedule_rearm(tx: &mpsc::UnboundedSender<()>, after: Duration) {
    let tx = tx.clone();
    tokio::spawn(async move {
        time::sleep(after).await;
        // Loop may have been cancelled in the meantime.
        let _ = tx.send(());
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SimulatedAdapter;

    fn poller() -> Poller {
        let (adapter, _mount) = SimulatedAdapter::new();
        Poller::new(WatchConfig::new("/media/test/RPI-RP2"), Arc::new(adapter))
    }

    #[test]
    fn starts_armed() {
        assert_eq!(poller().state, PollState::Armed);
    }

    #[test]
    fn rearm_is_idempotent() {
        let mut p = poller();
        p.state = PollState::Suppressed;
        p.rearm();
        assert_eq!(p.state, PollState::Armed);
        p.rearm();
        assert_eq!(p.state, PollState::Armed);
    }
}
