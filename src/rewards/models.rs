use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_BALANCE: u64 = 100;
pub const REDEEM_THRESHOLD: u64 = 1000;
pub const SCAN_SOURCE: &str = "QR Code Scan";
pub const DEFAULT_USER_NAME: &str = "Demo User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub points: u64,
}

impl User {
    pub fn new(email: impl Into<String>, points: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: DEFAULT_USER_NAME.to_string(),
            email: email.into(),
            points,
        }
    }
}

/// A committed point award. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub points: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingScan {
    pub points: u64,
    pub raw_data: String,
    /// Balance when the scan happened; the claim result is shown on top of it.
    pub new_total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScannerState {
    #[default]
    Idle,
    Active,
}

impl ScannerState {
    pub fn is_active(self) -> bool {
        matches!(self, ScannerState::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuccessNotice {
    pub points: u64,
    #[serde(skip)]
    pub seq: u64,
}
