use serde::{Deserialize, Serialize};

use super::interpreter::DEFAULT_POINTS;
use super::models::{ActivityEntry, PendingScan, ScannerState, SuccessNotice, User};
use super::session::RewardSession;

/// Number of activity entries surfaced to the client.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Snapshot of the session returned by every intent.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub logged_in: bool,
    pub user: Option<User>,
    pub points: u64,
    pub recent_activity: Vec<ActivityEntry>,
    pub scanner: ScannerState,
    pub pending_scan: Option<PendingScan>,
    pub scan_count: u64, // scans since the last redemption
    pub can_redeem: bool,
    pub thank_you: bool,
    pub success: Option<SuccessNotice>,
    pub camera_error: Option<String>,
}

impl From<&RewardSession> for SessionView {
    fn from(s: &RewardSession) -> Self {
        Self {
            logged_in: s.is_logged_in(),
            user: s.user().cloned(),
            points: s.balance(),
            recent_activity: s
                .activity()
                .iter()
                .take(RECENT_ACTIVITY_LIMIT)
                .cloned()
                .collect(),
            scanner: s.scanner(),
            pending_scan: s.pending().cloned(),
            scan_count: s.scan_count(),
            can_redeem: s.can_redeem(),
            thank_you: s.thank_you(),
            success: s.notice(),
            camera_error: s.camera_error().map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SampleQuery {
    pub points: Option<u64>,
}

impl SampleQuery {
    pub fn points(&self) -> u64 {
        self.points.unwrap_or(DEFAULT_POINTS)
    }
}

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub points: u64,
    pub payload: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_surfaces_five_newest_entries() {
        let now = time::macros::datetime!(2024-05-01 12:00 UTC);
        let mut s = RewardSession::restore(Some(User::new("demo@segro.app", 0)), Vec::new());
        for n in 1..=7 {
            let _ = s.start_scanner();
            let _ = s.on_decoded_payload(&format!("reward {n}"));
            let _ = s.claim(now);
        }
        let view = SessionView::from(&s);
        let points: Vec<u64> = view.recent_activity.iter().map(|a| a.points).collect();
        assert_eq!(points, vec![7, 6, 5, 4, 3]);
    }

    #[test]
    fn view_serializes_scanner_state_lowercase() {
        let view = SessionView::from(&RewardSession::default());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["scanner"], "idle");
        assert_eq!(json["logged_in"], false);
        assert_eq!(json["points"], 0);
    }
}
