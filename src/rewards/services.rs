use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use super::dto::SessionView;
use super::models::{ActivityEntry, ScannerState, User};
use super::session::{Persist, RewardSession, Transition};
use crate::scanner::DecodeEvent;
use crate::storage::KeyValueStore;

/// How long the "points added" notice stays up after a claim.
pub const NOTICE_TTL: Duration = Duration::from_millis(2500);

const COMMAND_BUFFER: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("reward session is not running")]
    Stopped,
}

/// User-initiated operations on the session.
pub enum Intent {
    Login { email: String, password: String },
    Logout,
    StartScanner,
    StopScanner,
    ToggleScanner,
    Claim,
    Donate,
    Dismiss,
    Redeem,
    View,
}

impl Intent {
    fn name(&self) -> &'static str {
        match self {
            Intent::Login { .. } => "login",
            Intent::Logout => "logout",
            Intent::StartScanner => "start_scanner",
            Intent::StopScanner => "stop_scanner",
            Intent::ToggleScanner => "toggle_scanner",
            Intent::Claim => "claim",
            Intent::Donate => "donate",
            Intent::Dismiss => "dismiss",
            Intent::Redeem => "redeem",
            Intent::View => "view",
        }
    }
}

enum Command {
    Intent(Intent, oneshot::Sender<SessionView>),
    Decode(DecodeEvent),
    ExpireNotice(u64),
}

/// Cheap, cloneable access to the session actor.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
    scanner: watch::Receiver<ScannerState>,
}

impl SessionHandle {
    /// Loads the stored records and starts the actor that owns the session.
    pub async fn spawn(store: Arc<dyn KeyValueStore>) -> Self {
        let user = User::load(store.as_ref()).await;
        let activity = ActivityEntry::load_all(store.as_ref()).await;
        info!(
            restored_user = user.is_some(),
            activity = activity.len(),
            "reward session restored"
        );
        Self::spawn_with(RewardSession::restore(user, activity), store)
    }

    fn spawn_with(session: RewardSession, store: Arc<dyn KeyValueStore>) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (scanner_tx, scanner_rx) = watch::channel(session.scanner());
        let actor = SessionActor {
            session,
            store,
            rx,
            loopback: tx.downgrade(),
            scanner_tx,
        };
        tokio::spawn(actor.run());
        Self {
            tx,
            scanner: scanner_rx,
        }
    }

    /// Applies `intent` and returns the resulting view.
    pub async fn send(&self, intent: Intent) -> Result<SessionView, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Intent(intent, reply_tx))
            .await
            .map_err(|_| SessionError::Stopped)?;
        reply_rx.await.map_err(|_| SessionError::Stopped)
    }

    pub async fn view(&self) -> Result<SessionView, SessionError> {
        self.send(Intent::View).await
    }

    /// Queues an event from the decoding side behind any pending intents.
    pub async fn deliver(&self, event: DecodeEvent) -> Result<(), SessionError> {
        self.tx
            .send(Command::Decode(event))
            .await
            .map_err(|_| SessionError::Stopped)
    }

    pub fn scanner_state(&self) -> watch::Receiver<ScannerState> {
        self.scanner.clone()
    }
}

struct SessionActor {
    session: RewardSession,
    store: Arc<dyn KeyValueStore>,
    rx: mpsc::Receiver<Command>,
    // weak so the actor stops once every handle is gone
    loopback: mpsc::WeakSender<Command>,
    scanner_tx: watch::Sender<ScannerState>,
}

impl SessionActor {
    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                Command::Intent(intent, reply) => {
                    debug!(intent = intent.name(), "session intent");
                    let t = self.apply(intent);
                    self.commit(t).await;
                    if reply.send(SessionView::from(&self.session)).is_err() {
                        debug!("intent caller went away before the reply");
                    }
                }
                Command::Decode(DecodeEvent::Decoded(raw)) => {
                    let t = self.session.on_decoded_payload(&raw);
                    self.commit(t).await;
                }
                Command::Decode(DecodeEvent::CameraUnavailable(reason)) => {
                    warn!(%reason, "camera unavailable");
                    let t = self.session.on_camera_unavailable(&reason);
                    self.commit(t).await;
                }
                Command::ExpireNotice(seq) => {
                    let t = self.session.expire_notice(seq);
                    self.commit(t).await;
                }
            }
        }
        debug!("reward session actor stopped");
    }

    fn apply(&mut self, intent: Intent) -> Transition {
        let s = &mut self.session;
        match intent {
            Intent::Login { email, password } => s.login(&email, &password),
            Intent::Logout => s.logout(),
            Intent::StartScanner => s.start_scanner(),
            Intent::StopScanner => s.stop_scanner(),
            Intent::ToggleScanner => s.toggle_scanner(),
            Intent::Claim => s.claim(OffsetDateTime::now_utc()),
            Intent::Donate => s.donate(),
            Intent::Dismiss => s.dismiss(),
            Intent::Redeem => s.redeem(),
            Intent::View => Transition::default(),
        }
    }

    async fn commit(&mut self, t: Transition) {
        self.persist(t.persist).await;
        if let Some(seq) = t.notice {
            self.schedule_notice_expiry(seq);
        }
        let scanner = self.session.scanner();
        self.scanner_tx.send_if_modified(|current| {
            if *current == scanner {
                false
            } else {
                *current = scanner;
                true
            }
        });
    }

    /// Writes are last-write-wins; a failed write is logged and the in-memory
    /// state is kept.
    async fn persist(&self, p: Persist) {
        if p.is_empty() {
            return;
        }
        let store = self.store.as_ref();
        if p.remove_user {
            if let Err(e) = User::remove(store).await {
                error!(error = %e, "remove user record failed");
            }
        }
        if p.save_user {
            if let Some(user) = self.session.user() {
                if let Err(e) = user.save(store).await {
                    error!(error = %e, user_id = %user.id, "save user record failed");
                }
            }
        }
        if p.save_activity {
            if let Err(e) = ActivityEntry::save_all(self.session.activity(), store).await {
                error!(error = %e, "save activity record failed");
            }
        }
    }

    fn schedule_notice_expiry(&self, seq: u64) {
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            tokio::time::sleep(NOTICE_TTL).await;
            if let Some(tx) = loopback.upgrade() {
                let _ = tx.send(Command::ExpireNotice(seq)).await;
            }
        });
    }
}
