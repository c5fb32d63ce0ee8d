use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    pub max_scans_per_second: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_scans_per_second: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_dir: PathBuf,
    pub scanner: ScannerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>()?,
            Err(_) => 8080,
        };
        let scanner = ScannerConfig {
            max_scans_per_second: std::env::var("SCANNER_MAX_SCANS_PER_SECOND")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(5),
        };
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port,
            store_dir: std::env::var("SEGRO_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".segro")),
            scanner,
        })
    }
}
