use time::OffsetDateTime;
use tracing::{debug, info};

use super::interpreter::extract_points;
use super::models::{
    ActivityEntry, PendingScan, ScannerState, SuccessNotice, User, DEFAULT_BALANCE,
    REDEEM_THRESHOLD, SCAN_SOURCE,
};

/// Records a transition wants written back to the store.
#[must_use]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Persist {
    pub save_user: bool,
    pub remove_user: bool,
    pub save_activity: bool,
}

impl Persist {
    pub const NONE: Persist = Persist {
        save_user: false,
        remove_user: false,
        save_activity: false,
    };

    fn user() -> Self {
        Self {
            save_user: true,
            ..Self::NONE
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// Outcome of a session operation. Precondition failures yield the default.
#[must_use]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub persist: Persist,
    /// Sequence number of a success notice raised by this transition.
    pub notice: Option<u64>,
}

impl From<Persist> for Transition {
    fn from(persist: Persist) -> Self {
        Self {
            persist,
            notice: None,
        }
    }
}

/// The reward ledger and scan workflow of one local user.
///
/// Pure state: every operation runs to completion, never touches storage, and
/// reports through [`Transition`] what has to be persisted.
#[derive(Debug, Default)]
pub struct RewardSession {
    user: Option<User>,
    activity: Vec<ActivityEntry>,
    scanner: ScannerState,
    pending: Option<PendingScan>,
    scan_count: u64,
    redeem_flag: bool,
    thank_you: bool,
    notice: Option<SuccessNotice>,
    notice_seq: u64,
    camera_error: Option<String>,
}

impl RewardSession {
    /// Session start: a stored user logs the session straight in.
    pub fn restore(user: Option<User>, activity: Vec<ActivityEntry>) -> Self {
        Self {
            user,
            activity,
            ..Self::default()
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn balance(&self) -> u64 {
        self.user.as_ref().map(|u| u.points).unwrap_or(0)
    }

    /// Newest first.
    pub fn activity(&self) -> &[ActivityEntry] {
        &self.activity
    }

    pub fn scanner(&self) -> ScannerState {
        self.scanner
    }

    pub fn pending(&self) -> Option<&PendingScan> {
        self.pending.as_ref()
    }

    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    pub fn thank_you(&self) -> bool {
        self.thank_you
    }

    pub fn notice(&self) -> Option<SuccessNotice> {
        self.notice
    }

    pub fn camera_error(&self) -> Option<&str> {
        self.camera_error.as_deref()
    }

    pub fn can_redeem(&self) -> bool {
        self.user.is_some() && (self.redeem_flag || self.balance() >= REDEEM_THRESHOLD)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Transition {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            debug!("login ignored: empty credentials");
            return Transition::default();
        }
        let points = self
            .user
            .as_ref()
            .map(|u| u.points)
            .unwrap_or(DEFAULT_BALANCE);
        let user = User::new(email, points);
        info!(user_id = %user.id, email = %user.email, points, "user logged in");
        self.user = Some(user);
        self.scanner = ScannerState::Idle;
        Persist::user().into()
    }

    pub fn logout(&mut self) -> Transition {
        let Some(user) = self.user.take() else {
            return Transition::default();
        };
        info!(user_id = %user.id, "user logged out");
        self.scanner = ScannerState::Idle;
        self.pending = None;
        self.thank_you = false;
        self.notice = None;
        self.redeem_flag = false;
        self.scan_count = 0;
        self.camera_error = None;
        Persist {
            remove_user: true,
            ..Persist::NONE
        }
        .into()
    }

    pub fn start_scanner(&mut self) -> Transition {
        if self.user.is_some() {
            self.camera_error = None;
            self.scanner = ScannerState::Active;
        }
        Transition::default()
    }

    pub fn stop_scanner(&mut self) -> Transition {
        if self.user.is_some() {
            self.scanner = ScannerState::Idle;
        }
        Transition::default()
    }

    pub fn toggle_scanner(&mut self) -> Transition {
        if self.scanner.is_active() {
            self.stop_scanner()
        } else {
            self.start_scanner()
        }
    }

    /// Decodes only count while the scanner is running; one queued before a
    /// stop is dropped.
    pub fn on_decoded_payload(&mut self, raw: &str) -> Transition {
        let Some(user) = self.user.as_ref() else {
            return Transition::default();
        };
        if !self.scanner.is_active() {
            debug!("decode ignored: scanner idle");
            return Transition::default();
        }
        self.thank_you = false;
        let points = extract_points(raw);
        self.pending = Some(PendingScan {
            points,
            raw_data: raw.to_string(),
            new_total: user.points,
        });
        self.scan_count += 1;
        self.scanner = ScannerState::Idle;
        info!(points, scan_count = self.scan_count, "qr code scanned");
        Transition::default()
    }

    pub fn on_camera_unavailable(&mut self, reason: &str) -> Transition {
        self.camera_error = Some(reason.to_string());
        self.scanner = ScannerState::Idle;
        Transition::default()
    }

    pub fn claim(&mut self, now: OffsetDateTime) -> Transition {
        let (Some(user), Some(pending)) = (self.user.as_mut(), self.pending.as_ref()) else {
            return Transition::default();
        };
        let points = pending.points;
        user.points = user.points.saturating_add(points);
        let balance = user.points;
        self.activity.insert(
            0,
            ActivityEntry {
                points,
                timestamp: now,
                source: SCAN_SOURCE.to_string(),
            },
        );
        self.pending = None;
        self.scanner = ScannerState::Active;
        self.notice_seq += 1;
        self.notice = Some(SuccessNotice {
            points,
            seq: self.notice_seq,
        });
        if balance >= REDEEM_THRESHOLD {
            self.redeem_flag = true;
        }
        info!(points, balance, "points claimed");
        Transition {
            persist: Persist {
                save_user: true,
                save_activity: true,
                ..Persist::NONE
            },
            notice: Some(self.notice_seq),
        }
    }

    pub fn donate(&mut self) -> Transition {
        if self.pending.is_some() {
            self.thank_you = true;
            info!("scan donated");
        }
        Transition::default()
    }

    pub fn dismiss(&mut self) -> Transition {
        if self.user.is_none() {
            return Transition::default();
        }
        self.pending = None;
        self.thank_you = false;
        self.scanner = ScannerState::Active;
        Transition::default()
    }

    pub fn redeem(&mut self) -> Transition {
        if !self.can_redeem() {
            return Transition::default();
        }
        let Some(user) = self.user.as_mut() else {
            return Transition::default();
        };
        info!(user_id = %user.id, redeemed = user.points, "points redeemed");
        user.points = 0;
        self.scan_count = 0;
        self.redeem_flag = false;
        self.pending = None;
        self.scanner = ScannerState::Active;
        Persist::user().into()
    }

    /// Clears the notice raised by claim `seq`, unless a later claim replaced it.
    pub fn expire_notice(&mut self, seq: u64) -> Transition {
        if self.notice.is_some_and(|n| n.seq == seq) {
            self.notice = None;
        }
        Transition::default()
    }
}
