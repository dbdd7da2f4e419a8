// ============================================================================
// Candle model: price history buckets, display ranges and bucket intervals
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Start of the "max" range window, 1980-01-01T00:00:00Z.
const MAX_RANGE_START: i64 = 315_532_800;

/// Total span of history shown on the chart.
///
/// Serialized with the short names the range selector uses, so the persisted
/// session blob stays readable (`"1y"`, `"max"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Range {
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    Max,
}

impl Range {
    /// Number of days the window covers, `None` for the unbounded range.
    pub fn window_days(&self) -> Option<i64> {
        match self {
            Range::OneMonth => Some(30),
            Range::ThreeMonths => Some(90),
            Range::SixMonths => Some(180),
            Range::OneYear => Some(365),
            Range::FiveYears => Some(5 * 365),
            Range::Max => None,
        }
    }

    /// Unix timestamp where the window starts, relative to `now`.
    /// The unbounded range starts at a fixed epoch well before any listing.
    pub fn start_timestamp(&self, now: DateTime<Utc>) -> i64 {
        match self.window_days() {
            Some(days) => now.timestamp() - days * 86_400,
            None => MAX_RANGE_START,
        }
    }

    /// Short label for the range selector.
    pub fn label(&self) -> &'static str {
        match self {
            Range::OneMonth => "1m",
            Range::ThreeMonths => "3m",
            Range::SixMonths => "6m",
            Range::OneYear => "1y",
            Range::FiveYears => "5y",
            Range::Max => "max",
        }
    }

    /// All ranges in selector order.
    pub fn all() -> [Range; 6] {
        [
            Range::OneMonth,
            Range::ThreeMonths,
            Range::SixMonths,
            Range::OneYear,
            Range::FiveYears,
            Range::Max,
        ]
    }

    /// Next wider range, saturating at `max`.
    pub fn next(&self) -> Range {
        let all = Range::all();
        let pos = all.iter().position(|r| r == self).unwrap_or(0);
        all[(pos + 1).min(all.len() - 1)]
    }

    /// Next narrower range, saturating at `1m`.
    pub fn previous(&self) -> Range {
        let all = Range::all();
        let pos = all.iter().position(|r| r == self).unwrap_or(0);
        all[pos.saturating_sub(1)]
    }
}

impl Default for Range {
    fn default() -> Self {
        Range::OneYear
    }
}

/// Width of one candle bucket.
///
/// Upstream data is always daily; weekly and monthly series are derived
/// locally by resampling. Serialized as the original selector values
/// (`"d"`, `"w"`, `"m"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "d")]
    Daily,
    #[serde(rename = "w")]
    Weekly,
    #[serde(rename = "m")]
    Monthly,
}

impl Interval {
    pub fn label(&self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
        }
    }

    /// Cycle daily → weekly → monthly → daily.
    pub fn next(&self) -> Interval {
        match self {
            Interval::Daily => Interval::Weekly,
            Interval::Weekly => Interval::Monthly,
            Interval::Monthly => Interval::Daily,
        }
    }

    pub fn previous(&self) -> Interval {
        match self {
            Interval::Daily => Interval::Monthly,
            Interval::Weekly => Interval::Daily,
            Interval::Monthly => Interval::Weekly,
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Interval::Daily
    }
}

/// One OHLCV bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    pub fn new(ts: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Advancing candles (close at or above open) color volume green,
    /// declining ones red.
    pub fn is_advancing(&self) -> bool {
        self.close >= self.open
    }
}

/// An ordered price history for one symbol at one range/interval.
///
/// Candles are kept in ascending timestamp order; the fetch and resample
/// paths both preserve it.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    pub symbol: String,
    pub range: Range,
    pub interval: Interval,
    pub candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(symbol: &str, range: Range, interval: Interval) -> Self {
        Self {
            symbol: symbol.to_string(),
            range,
            interval,
            candles: Vec::new(),
        }
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    /// Reference close for the change computation: the second-to-last close,
    /// or the last open when only a single bucket exists.
    pub fn previous_close(&self) -> Option<f64> {
        let n = self.candles.len();
        if n >= 2 {
            Some(self.candles[n - 2].close)
        } else {
            self.candles.last().map(|c| c.open)
        }
    }

    /// (absolute, percent) change of the latest close vs the previous close.
    pub fn change(&self) -> Option<(f64, f64)> {
        let last = self.last_close()?;
        let prev = self.previous_close()?;
        if prev == 0.0 {
            return None;
        }
        let abs = last - prev;
        Some((abs, abs / prev * 100.0))
    }

    /// Lowest low over the series.
    pub fn min_low(&self) -> Option<f64> {
        self.candles
            .iter()
            .map(|c| c.low)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Highest high over the series.
    pub fn max_high(&self) -> Option<f64> {
        self.candles
            .iter()
            .map(|c| c.high)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn max_volume(&self) -> u64 {
        self.candles.iter().map(|c| c.volume).max().unwrap_or(0)
    }
}

/// Builds a UTC timestamp from a date, midnight. Test helper.
#[cfg(test)]
pub fn day_ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    use chrono::TimeZone;
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

// ============================================================================
// Tests
// ============================================================================
