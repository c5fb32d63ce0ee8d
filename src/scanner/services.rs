use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::camera::Lens;
use super::DecodeEvent;
use crate::config::ScannerConfig;
use crate::rewards::models::ScannerState;
use crate::rewards::services::SessionHandle;

/// Drops a decode identical to the one right before it.
#[derive(Debug, Default)]
pub struct Deduper {
    last: Option<String>,
}

impl Deduper {
    pub fn accept(&mut self, text: &str) -> bool {
        if self.last.as_deref() == Some(text) {
            return false;
        }
        self.last = Some(text.to_string());
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

pub fn scan_period(config: &ScannerConfig) -> Duration {
    Duration::from_millis(1000 / u64::from(config.max_scans_per_second.max(1)))
}

/// Samples the camera while the session's scanner is active and feeds decode
/// events into the session. Runs until the session goes away.
pub fn spawn_scan_loop(
    camera: watch::Receiver<Lens>,
    session: SessionHandle,
    config: &ScannerConfig,
) -> JoinHandle<()> {
    let scan_loop = ScanLoop {
        camera,
        state: session.scanner_state(),
        session,
        period: scan_period(config),
    };
    tokio::spawn(scan_loop.run())
}

struct ScanLoop {
    camera: watch::Receiver<Lens>,
    state: watch::Receiver<ScannerState>,
    session: SessionHandle,
    period: Duration,
}

impl ScanLoop {
    async fn run(mut self) {
        let mut dedup = Deduper::default();
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if !self.state.borrow_and_update().is_active() {
                // every activation starts a fresh decoder
                dedup.reset();
                if self.state.changed().await.is_err() {
                    break;
                }
                debug!("scanner activated");
                continue;
            }

            tokio::select! {
                changed = self.state.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let lens = self.camera.borrow().clone();
            let event = match lens {
                Lens { fault: Some(reason), .. } => DecodeEvent::CameraUnavailable(reason),
                Lens { frame: Some(text), .. } if dedup.accept(&text) => {
                    DecodeEvent::Decoded(text)
                }
                _ => continue,
            };
            if self.session.deliver(event).await.is_err() {
                break;
            }
        }
        info!("scan loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::rewards::services::Intent;
    use crate::scanner::Camera;
    use crate::storage::{KeyValueStore, MemoryStore};

    async fn setup() -> (Camera, SessionHandle) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
        let session = SessionHandle::spawn(store).await;
        let camera = Camera::new();
        spawn_scan_loop(camera.subscribe(), session.clone(), &ScannerConfig::default());
        session
            .send(Intent::Login {
                email: "demo@segro.app".into(),
                password: "secret".into(),
            })
            .await
            .expect("login");
        (camera, session)
    }

    #[test]
    fn deduper_suppresses_only_consecutive_repeats() {
        let mut d = Deduper::default();
        assert!(d.accept("a"));
        assert!(!d.accept("a"));
        assert!(d.accept("b"));
        assert!(d.accept("a"));
        d.reset();
        assert!(d.accept("a"));
    }

    #[test]
    fn default_period_caps_at_five_per_second() {
        assert_eq!(scan_period(&ScannerConfig::default()), Duration::from_millis(200));
        let zero = ScannerConfig {
            max_scans_per_second: 0,
        };
        assert_eq!(scan_period(&zero), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn decoded_frame_becomes_pending_scan() {
        let (camera, session) = setup().await;
        camera.show(Some(r#"{"points":50}"#.into()));
        session.send(Intent::StartScanner).await.expect("start");

        tokio::time::sleep(Duration::from_secs(1)).await;
        let view = session.view().await.expect("view");
        assert_eq!(view.pending_scan.map(|p| p.points), Some(50));
        assert_eq!(view.scan_count, 1);
        assert_eq!(view.scanner, ScannerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_scanner_ignores_camera() {
        let (camera, session) = setup().await;
        camera.show(Some("reward 5".into()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let view = session.view().await.expect("view");
        assert!(view.pending_scan.is_none());
        assert_eq!(view.scan_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn camera_fault_is_reported() {
        let (camera, session) = setup().await;
        camera.set_available(false, Some("permission denied".into()));
        session.send(Intent::StartScanner).await.expect("start");

        tokio::time::sleep(Duration::from_secs(1)).await;
        let view = session.view().await.expect("view");
        assert_eq!(view.camera_error.as_deref(), Some("permission denied"));
        assert_eq!(view.scanner, ScannerState::Idle);
        assert!(view.pending_scan.is_none());
    }
}
