//! Path configuration, read from the environment (and `.env` via `dotenvy`).

use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_RAW_FILE: &str = "norwegian_traffic_nvdb.csv";
const DEFAULT_PROCESSED_FILE: &str = "traffic_insights_processed.csv";
const DEFAULT_DASHBOARD_FILE: &str = "dashboard.html";
const DEFAULT_LOG_FILE: &str = "logs/nvdb_traffic_insights.log";

/// Resolved file locations for a run.
///
/// | Variable              | Default                          |
/// |-----------------------|----------------------------------|
/// | `NVDB_DATA_DIR`       | `data`                           |
/// | `NVDB_RAW_FILE`       | `norwegian_traffic_nvdb.csv`     |
/// | `NVDB_PROCESSED_FILE` | `traffic_insights_processed.csv` |
/// | `NVDB_DASHBOARD_FILE` | `dashboard.html`                 |
/// | `LOG_FILE_PATH`       | `logs/nvdb_traffic_insights.log` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub raw_file_name: String,
    pub raw_path: PathBuf,
    pub processed_path: PathBuf,
    pub dashboard_path: PathBuf,
    pub log_file_path: PathBuf,
}

impl Settings {
    /// Loads `.env` (if present) and reads settings from the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let data_dir = PathBuf::from(var("NVDB_DATA_DIR", DEFAULT_DATA_DIR));
        let raw_file_name = var("NVDB_RAW_FILE", DEFAULT_RAW_FILE);
        let processed_dir = data_dir.join("processed");

        Self {
            raw_path: data_dir.join("raw").join(&raw_file_name),
            raw_file_name,
            processed_path: processed_dir.join(var("NVDB_PROCESSED_FILE", DEFAULT_PROCESSED_FILE)),
            dashboard_path: processed_dir.join(var("NVDB_DASHBOARD_FILE", DEFAULT_DASHBOARD_FILE)),
            log_file_path: PathBuf::from(var("LOG_FILE_PATH", DEFAULT_LOG_FILE)),
        }
    }
}
