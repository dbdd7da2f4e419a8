// ============================================================================
// Trade markers: user-recorded buys and sells overlaid on the chart
// ============================================================================

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl TradeKind {
    pub fn label(&self) -> &'static str {
        match self {
            TradeKind::Buy => "buy",
            TradeKind::Sell => "sell",
        }
    }
}

/// One recorded trade. Dates are calendar days; the marker lands on the
/// candle for that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMarker {
    pub date: NaiveDate,
    pub price: f64,
    #[serde(rename = "type")]
    pub kind: TradeKind,
}

impl TradeMarker {
    /// Midnight UTC of the trade day, as epoch seconds. Chart datasets
    /// match on this timestamp.
    pub fn timestamp(&self) -> i64 {
        self.date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0)
    }
}

/// Parses a marker entered as one line: `YYYY-MM-DD PRICE buy|sell`.
pub fn parse_marker_entry(input: &str) -> Result<TradeMarker> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() != 3 {
        bail!("expected: YYYY-MM-DD PRICE buy|sell");
    }

    let date = NaiveDate::parse_from_str(parts[0], "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}'", parts[0]))?;
    let price: f64 = parts[1]
        .parse()
        .with_context(|| format!("invalid price '{}'", parts[1]))?;
    if price <= 0.0 {
        bail!("price must be positive");
    }
    let kind = match parts[2].to_lowercase().as_str() {
        "buy" => TradeKind::Buy,
        "sell" => TradeKind::Sell,
        other => bail!("invalid side '{}', expected buy or sell", other),
    };

    Ok(TradeMarker { date, price, kind })
}

/// All recorded trades, keyed by ticker. Serializes as a plain
/// `{"NVDA": [..]}` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeLog {
    trades: BTreeMap<String, Vec<TradeMarker>>,
}

impl TradeLog {
    pub fn add(&mut self, ticker: &str, marker: TradeMarker) {
        self.trades
            .entry(ticker.trim().to_uppercase())
            .or_default()
            .push(marker);
    }

    /// Markers for a ticker, oldest entry first. Unknown tickers yield an
    /// empty slice.
    pub fn for_ticker(&self, ticker: &str) -> &[TradeMarker] {
        self.trades
            .get(&ticker.trim().to_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_marker_entry() {
        let marker = parse_marker_entry("2024-03-01 450.50 buy").unwrap();
        assert_eq!(marker.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!((marker.price - 450.50).abs() < 1e-9);
        assert_eq!(marker.kind, TradeKind::Buy);

        let marker = parse_marker_entry("2023-11-20 600 SELL").unwrap();
        assert_eq!(marker.kind, TradeKind::Sell);
    }

    #[test]
    fn test_parse_marker_entry_rejects_garbage() {
        assert!(parse_marker_entry("").is_err());
        assert!(parse_marker_entry("2024-03-01 450").is_err());
        assert!(parse_marker_entry("03/01/2024 450 buy").is_err());
        assert!(parse_marker_entry("2024-03-01 abc buy").is_err());
        assert!(parse_marker_entry("2024-03-01 -5 buy").is_err());
        assert!(parse_marker_entry("2024-03-01 450 hold").is_err());
    }

    #[test]
    fn test_log_keys_are_uppercased() {
        let mut log = TradeLog::default();
        log.add("nvda", parse_marker_entry("2024-03-01 450 buy").unwrap());
        assert_eq!(log.for_ticker("NVDA").len(), 1);
        assert_eq!(log.for_ticker(" nvda ").len(), 1);
        assert!(log.for_ticker("AAPL").is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let mut log = TradeLog::default();
        log.add("NVDA", parse_marker_entry("2024-03-01 450 buy").unwrap());

        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(
            json,
            r#"{"NVDA":[{"date":"2024-03-01","price":450.0,"type":"buy"}]}"#
        );

        let back: TradeLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back.for_ticker("NVDA")[0].kind, TradeKind::Buy);
    }

    #[test]
    fn test_timestamp_is_midnight_utc() {
        let marker = parse_marker_entry("2024-01-01 100 buy").unwrap();
        assert_eq!(marker.timestamp(), 1_704_067_200);
    }
}
