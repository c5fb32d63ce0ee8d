use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{AppConfig, ScannerConfig};
use crate::rewards::services::SessionHandle;
use crate::scanner::{spawn_scan_loop, Camera};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: SessionHandle,
    pub camera: Camera,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = Arc::new(FileStore::open(&config.store_dir).await?) as Arc<dyn KeyValueStore>;
        tracing::info!(dir = %config.store_dir.display(), "using local store");

        Ok(Self::from_parts(config, store).await)
    }

    /// Starts the session actor and the scan loop over `store`.
    pub async fn from_parts(config: Arc<AppConfig>, store: Arc<dyn KeyValueStore>) -> Self {
        let session = SessionHandle::spawn(store).await;
        let camera = Camera::new();
        spawn_scan_loop(camera.subscribe(), session.clone(), &config.scanner);
        Self {
            config,
            session,
            camera,
        }
    }

    pub async fn fake() -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            store_dir: PathBuf::from("unused"),
            scanner: ScannerConfig::default(),
        });
        let store = Arc::new(MemoryStore::default()) as Arc<dyn KeyValueStore>;
        Self::from_parts(config, store).await
    }
}
