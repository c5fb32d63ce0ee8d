use anyhow::Context;
use serde::de::DeserializeOwned;
use tracing::warn;

use super::models::{ActivityEntry, User};
use crate::storage::KeyValueStore;

pub const USER_KEY: &str = "segro-user";
pub const ACTIVITY_KEY: &str = "segro-activity";

/// Reads and decodes one record. Missing, unreadable and malformed records
/// all come back as `None`.
async fn load_record<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, key, "stored record unreadable; treating as absent");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, key, "stored record malformed; treating as absent");
            None
        }
    }
}

impl User {
    pub async fn load(store: &dyn KeyValueStore) -> Option<User> {
        load_record(store, USER_KEY).await
    }

    pub async fn save(&self, store: &dyn KeyValueStore) -> anyhow::Result<()> {
        let json = serde_json::to_string(self).context("encode user")?;
        store.set(USER_KEY, &json).await
    }

    pub async fn remove(store: &dyn KeyValueStore) -> anyhow::Result<()> {
        store.remove(USER_KEY).await
    }
}

impl ActivityEntry {
    pub async fn load_all(store: &dyn KeyValueStore) -> Vec<ActivityEntry> {
        load_record(store, ACTIVITY_KEY).await.unwrap_or_default()
    }

    pub async fn save_all(entries: &[ActivityEntry], store: &dyn KeyValueStore) -> anyhow::Result<()> {
        let json = serde_json::to_string(entries).context("encode activity")?;
        store.set(ACTIVITY_KEY, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn user_record_round_trips() {
        let store = MemoryStore::default();
        let user = User::new("demo@segro.app", 150);
        user.save(&store).await.expect("save");
        assert_eq!(User::load(&store).await, Some(user));

        User::remove(&store).await.expect("remove");
        assert_eq!(User::load(&store).await, None);
    }

    #[tokio::test]
    async fn corrupt_records_are_absent() {
        let store = MemoryStore::with_entries([
            (USER_KEY, "{not json"),
            (ACTIVITY_KEY, r#"[{"points":"many"}]"#),
        ]);
        assert_eq!(User::load(&store).await, None);
        assert!(ActivityEntry::load_all(&store).await.is_empty());
    }

    #[tokio::test]
    async fn activity_timestamps_are_rfc3339() {
        let store = MemoryStore::default();
        let entries = vec![ActivityEntry {
            points: 50,
            timestamp: time::macros::datetime!(2024-05-01 12:00 UTC),
            source: "QR Code Scan".into(),
        }];
        ActivityEntry::save_all(&entries, &store).await.expect("save");

        let raw = store.get(ACTIVITY_KEY).await.expect("get").expect("present");
        assert!(raw.contains("2024-05-01T12:00:00Z"));
        assert_eq!(ActivityEntry::load_all(&store).await, entries);
    }
}
