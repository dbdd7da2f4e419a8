// ============================================================================
// Watchlist: persisted entries plus their live quote state
// ============================================================================

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Group assigned when the user leaves the group prompt empty.
pub const DEFAULT_GROUP: &str = "Default";

/// One tracked position. The quote fields are refreshed at runtime and
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub ticker: String,
    #[serde(default)]
    pub name: String,
    pub buy_price: f64,
    pub group: String,
    pub added_at: DateTime<Utc>,
    #[serde(skip)]
    pub current_price: Option<f64>,
}

impl WatchlistEntry {
    pub fn new(ticker: &str, buy_price: f64, group: &str) -> Self {
        let group = if group.trim().is_empty() {
            DEFAULT_GROUP.to_string()
        } else {
            group.trim().to_string()
        };
        Self {
            ticker: ticker.trim().to_uppercase(),
            name: String::new(),
            buy_price,
            group,
            added_at: Utc::now(),
            current_price: None,
        }
    }

    /// Fills in the quote fields after a refresh. The name is only
    /// backfilled when the entry does not have one yet.
    pub fn apply_quote(&mut self, price: f64, name: Option<&str>) {
        self.current_price = Some(price);
        if self.name.is_empty() {
            if let Some(n) = name.filter(|n| !n.trim().is_empty()) {
                self.name = n.to_string();
            }
        }
    }

    /// Return since purchase, in percent. Needs a refreshed price and a
    /// positive buy price.
    pub fn return_percent(&self) -> Option<f64> {
        let current = self.current_price?;
        if self.buy_price > 0.0 {
            Some((current - self.buy_price) / self.buy_price * 100.0)
        } else {
            None
        }
    }

    pub fn is_positive(&self) -> bool {
        self.return_percent().map(|r| r >= 0.0).unwrap_or(false)
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.ticker
        } else {
            &self.name
        }
    }

    /// Formats the entry as one aligned list row:
    /// `NVDA     NVIDIA Corp.        Tech        $450.00   $522.53   ▲ +16.12%`
    pub fn display(&self) -> String {
        let price_str = match self.current_price {
            Some(price) => format!("${:.2}", price),
            None => "-".to_string(),
        };

        let return_str = match self.return_percent() {
            Some(ret) => {
                let arrow = if ret >= 0.0 { "▲" } else { "▼" };
                format!("{} {:+.2}%", arrow, ret)
            }
            None => "-".to_string(),
        };

        let name = self.display_name();
        let truncated_name = if name.chars().count() <= 18 {
            name.to_string()
        } else {
            let truncated: String = name.chars().take(17).collect();
            format!("{}…", truncated)
        };

        let truncated_group = if self.group.chars().count() <= 10 {
            self.group.clone()
        } else {
            let truncated: String = self.group.chars().take(9).collect();
            format!("{}…", truncated)
        };

        format!(
            "{:<8} {:<18} {:<10} {:>9} {:>9}  {}",
            self.ticker,
            truncated_name,
            truncated_group,
            format!("${:.2}", self.buy_price),
            price_str,
            return_str
        )
    }
}

/// The whole persisted list: group names plus entries. Groups survive even
/// when their last entry is removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watchlist {
    #[serde(default = "default_groups")]
    pub groups: Vec<String>,
    #[serde(default)]
    pub stocks: Vec<WatchlistEntry>,
}

fn default_groups() -> Vec<String> {
    vec![DEFAULT_GROUP.to_string()]
}

impl Default for Watchlist {
    fn default() -> Self {
        Self {
            groups: default_groups(),
            stocks: Vec::new(),
        }
    }
}

impl Watchlist {
    /// Adds an entry, rejecting duplicates. The existing entry is left
    /// untouched when the ticker is already tracked.
    pub fn add(&mut self, entry: WatchlistEntry) -> Result<()> {
        if self.contains(&entry.ticker) {
            bail!("{} is already on the watchlist", entry.ticker);
        }
        if !self.groups.iter().any(|g| g == &entry.group) {
            self.groups.push(entry.group.clone());
        }
        self.stocks.push(entry);
        Ok(())
    }

    pub fn contains(&self, ticker: &str) -> bool {
        let ticker = ticker.trim().to_uppercase();
        self.stocks.iter().any(|s| s.ticker == ticker)
    }

    /// Removes by ticker. Returns false when the ticker was not tracked.
    pub fn remove(&mut self, ticker: &str) -> bool {
        let before = self.stocks.len();
        self.stocks.retain(|s| s.ticker != ticker);
        self.stocks.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    /// Entries matching the group filter, in insertion order. `None` means
    /// every group.
    pub fn visible(&self, group: Option<&str>) -> Vec<&WatchlistEntry> {
        self.stocks
            .iter()
            .filter(|s| group.map(|g| s.group == g).unwrap_or(true))
            .collect()
    }

    /// Ticker at a position within the filtered view, for selection-based
    /// operations.
    pub fn visible_ticker(&self, group: Option<&str>, index: usize) -> Option<String> {
        self.visible(group).get(index).map(|s| s.ticker.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_duplicate_and_keeps_original() {
        let mut list = Watchlist::default();
        list.add(WatchlistEntry::new("NVDA", 450.0, "Tech")).unwrap();

        let err = list.add(WatchlistEntry::new("nvda", 999.0, "Other"));
        assert!(err.is_err());
        assert_eq!(list.len(), 1);
        assert!((list.stocks[0].buy_price - 450.0).abs() < 1e-9);
        assert_eq!(list.stocks[0].group, "Tech");
    }

    #[test]
    fn test_add_registers_new_group() {
        let mut list = Watchlist::default();
        list.add(WatchlistEntry::new("AAPL", 180.0, "Growth")).unwrap();
        assert!(list.groups.iter().any(|g| g == "Growth"));
        // Adding to a known group does not duplicate it.
        list.add(WatchlistEntry::new("MSFT", 400.0, "Growth")).unwrap();
        assert_eq!(list.groups.iter().filter(|g| *g == "Growth").count(), 1);
    }

    #[test]
    fn test_empty_group_falls_back_to_default() {
        let entry = WatchlistEntry::new("TSLA", 238.0, "   ");
        assert_eq!(entry.group, DEFAULT_GROUP);
    }

    #[test]
    fn test_group_filter() {
        let mut list = Watchlist::default();
        list.add(WatchlistEntry::new("NVDA", 450.0, "Tech")).unwrap();
        list.add(WatchlistEntry::new("AAPL", 180.0, "Tech")).unwrap();
        list.add(WatchlistEntry::new("KO", 60.0, "Dividend")).unwrap();

        assert_eq!(list.visible(None).len(), 3);
        assert_eq!(list.visible(Some("Tech")).len(), 2);
        assert_eq!(list.visible(Some("Dividend")).len(), 1);
        assert_eq!(
            list.visible_ticker(Some("Tech"), 1),
            Some("AAPL".to_string())
        );
        assert_eq!(list.visible_ticker(Some("Tech"), 2), None);
    }

    #[test]
    fn test_remove() {
        let mut list = Watchlist::default();
        list.add(WatchlistEntry::new("NVDA", 450.0, "Tech")).unwrap();
        assert!(list.remove("NVDA"));
        assert!(!list.remove("NVDA"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_return_percent() {
        let mut entry = WatchlistEntry::new("NVDA", 400.0, "Tech");
        assert!(entry.return_percent().is_none());

        entry.apply_quote(500.0, Some("NVIDIA Corp."));
        let ret = entry.return_percent().unwrap();
        assert!((ret - 25.0).abs() < 1e-9);
        assert!(entry.is_positive());
        assert_eq!(entry.display_name(), "NVIDIA Corp.");
    }

    #[test]
    fn test_zero_buy_price_has_no_return() {
        let mut entry = WatchlistEntry::new("NVDA", 0.0, "Tech");
        entry.apply_quote(500.0, None);
        assert!(entry.return_percent().is_none());
    }

    #[test]
    fn test_serialized_shape_uses_camel_case() {
        let mut list = Watchlist::default();
        list.add(WatchlistEntry::new("NVDA", 450.0, "Tech")).unwrap();

        let json = serde_json::to_string(&list).unwrap();
        assert!(json.contains("\"buyPrice\":450.0"));
        assert!(json.contains("\"addedAt\""));
        assert!(json.contains("\"groups\""));
        // Runtime quote state is never stored.
        assert!(!json.contains("currentPrice"));

        let back: Watchlist = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stocks[0].ticker, "NVDA");
        assert!(back.stocks[0].current_price.is_none());
    }
}
