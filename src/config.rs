use std::path::{Path, PathBuf};

use compact_str::CompactString;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::result::{Result, TrackerError};

/// Settings persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GerritCheckConfig {
    pub server: CompactString,
    pub project: CompactString,
    pub username: CompactString,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub log_level: Option<CompactString>,
    pub log_responses: bool,
}

impl Default for GerritCheckConfig {
    fn default() -> Self {
        Self {
            server: CompactString::default(),
            project: CompactString::default(),
            username: CompactString::default(),
            poll_interval_secs: 300,
            request_timeout_secs: 30,
            log_level: None,
            log_responses: false,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    if let Some(dirs) = BaseDirs::new() {
        dirs.config_dir().join("gerrit-check.toml")
    } else {
        PathBuf::from("gerrit-check.toml")
    }
}

/// Where raw response dumps go when response logging is on
pub fn default_response_log_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.data_local_dir().join("gerrit-check").join("responses"))
}

/// Load the config file, writing defaults if it does not exist yet
pub fn load_config(config_file: &Path) -> Result<GerritCheckConfig> {
    confy::load_path(config_file)
        .map_err(|e| TrackerError::config_load_error(config_file.to_path_buf(), e))
}

pub fn save_config(config_file: &Path, config: &GerritCheckConfig) -> Result<()> {
    confy::store_path(config_file, config)
        .map_err(|e| TrackerError::config_save_error(config_file.to_path_buf(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: GerritCheckConfig = serde_json::from_str(r#"{"server": "https://r"}"#).unwrap();
        assert_eq!(config.server, "https://r");
        assert_eq!(config.poll_interval_secs, 300);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn round_trips_through_disk() {
        let path = std::env::temp_dir().join(format!(
            "gerrit-check-test-{}.toml",
            std::process::id()
        ));
        let config = GerritCheckConfig {
            server: "https://review.example.org".into(),
            project: "core".into(),
            username: "jdoe".into(),
            ..Default::default()
        };

        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
