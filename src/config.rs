// ============================================================================
// Configuration
// ============================================================================
// Optional config.json under the platform config directory. Every field has
// a default, so no file (or a partial one) is fine. A malformed file is
// logged and ignored rather than refusing to start.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

pub const APP_DIR: &str = "marketlens";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Quote/chart API base URL.
    pub api_base: String,
    /// Earnings-document server base URL.
    pub docs_base: String,
    /// Per-request timeout, seconds.
    pub timeout_secs: u64,
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://query1.finance.yahoo.com".to_string(),
            docs_base: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            data_dir: None,
        }
    }
}

impl Config {
    /// Loads from the default location, falling back to defaults when the
    /// file is absent or unreadable.
    pub fn load() -> Self {
        match config_file() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            // Missing file is the normal case, not worth a log line.
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!("ignoring malformed config {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Where persisted state (watchlist, trades, session, logs) lives.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("./data"))
    }
}

fn config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.json"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base, "https://query1.finance.yahoo.com");
        assert_eq!(config.docs_base, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"docsBase": "http://docs.internal:9000"}"#).unwrap();
        assert_eq!(config.docs_base, "http://docs.internal:9000");
        assert_eq!(config.api_base, "https://query1.finance.yahoo.com");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/config.json"));
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_data_dir_override() {
        let mut config = Config::default();
        config.data_dir = Some(PathBuf::from("/tmp/elsewhere"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/elsewhere"));
    }
}
