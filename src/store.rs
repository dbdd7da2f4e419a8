// ============================================================================
// Persisted state: watchlist, trade markers, last session
// ============================================================================
// Three small JSON files under the data directory. Loads are tolerant: a
// missing or unreadable file yields the empty default so a fresh install
// and a corrupted file both start clean. Saves propagate errors; the caller
// decides whether that is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::markers::TradeLog;
use crate::models::watchlist::Watchlist;

const WATCHLIST_FILE: &str = "watchlist.json";
const TRADES_FILE: &str = "trades.json";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    last_ticker: String,
}

#[derive(Debug, Clone)]
pub struct Store {
    base: PathBuf,
}

impl Store {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn load_watchlist(&self) -> Watchlist {
        load_or_default(&self.base.join(WATCHLIST_FILE))
    }

    pub fn save_watchlist(&self, watchlist: &Watchlist) -> Result<()> {
        self.save_json(WATCHLIST_FILE, watchlist)
    }

    pub fn load_trades(&self) -> TradeLog {
        load_or_default(&self.base.join(TRADES_FILE))
    }

    pub fn save_trades(&self, trades: &TradeLog) -> Result<()> {
        self.save_json(TRADES_FILE, trades)
    }

    /// Ticker shown when the app last exited, if any.
    pub fn load_session(&self) -> Option<String> {
        let session: Session = load_or_default(&self.base.join(SESSION_FILE));
        if session.last_ticker.is_empty() {
            None
        } else {
            Some(session.last_ticker)
        }
    }

    pub fn save_session(&self, last_ticker: &str) -> Result<()> {
        self.save_json(
            SESSION_FILE,
            &Session {
                last_ticker: last_ticker.to_string(),
            },
        )
    }

    fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.base)
            .with_context(|| format!("creating data directory {}", self.base.display()))?;
        let path = self.base.join(name);
        let json = serde_json::to_string_pretty(value).context("serializing state")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))
    }
}

fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        // First run: nothing persisted yet.
        Err(_) => return T::default(),
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            warn!("ignoring corrupt state file {}: {}", path.display(), err);
            T::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::markers::parse_marker_entry;
    use crate::models::watchlist::WatchlistEntry;

    fn temp_store(tag: &str) -> Store {
        let base = std::env::temp_dir().join(format!(
            "marketlens-store-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&base);
        Store::new(base)
    }

    #[test]
    fn test_first_run_yields_empty_state() {
        let store = temp_store("fresh");
        assert!(store.load_watchlist().is_empty());
        assert!(store.load_trades().is_empty());
        assert!(store.load_session().is_none());
    }

    #[test]
    fn test_watchlist_survives_reload() {
        let store = temp_store("watchlist");

        let mut watchlist = store.load_watchlist();
        watchlist
            .add(WatchlistEntry::new("NVDA", 450.0, "Tech"))
            .unwrap();
        store.save_watchlist(&watchlist).unwrap();

        // Fresh Store over the same directory, as after a restart.
        let reloaded = Store::new(store.base().to_path_buf()).load_watchlist();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.stocks[0].ticker, "NVDA");
        assert!((reloaded.stocks[0].buy_price - 450.0).abs() < 1e-9);
        assert_eq!(reloaded.stocks[0].group, "Tech");

        let _ = fs::remove_dir_all(store.base());
    }

    #[test]
    fn test_trades_round_trip() {
        let store = temp_store("trades");

        let mut trades = TradeLog::default();
        trades.add("NVDA", parse_marker_entry("2024-03-01 450 buy").unwrap());
        store.save_trades(&trades).unwrap();

        let reloaded = store.load_trades();
        assert_eq!(reloaded.for_ticker("NVDA").len(), 1);

        let _ = fs::remove_dir_all(store.base());
    }

    #[test]
    fn test_session_round_trip() {
        let store = temp_store("session");
        store.save_session("NVDA").unwrap();
        assert_eq!(store.load_session().as_deref(), Some("NVDA"));

        let _ = fs::remove_dir_all(store.base());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let store = temp_store("corrupt");
        fs::create_dir_all(store.base()).unwrap();
        fs::write(store.base().join(WATCHLIST_FILE), "{not json").unwrap();

        assert!(store.load_watchlist().is_empty());

        let _ = fs::remove_dir_all(store.base());
    }
}
