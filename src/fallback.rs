// ============================================================================
// Static fallback table
// ============================================================================
// Middle tier of the field resolution chain. Records are intentionally
// uneven: some symbols carry only a name and a reference price, one carries
// the full card. Missing fields fall through to placeholders.

use chrono::{Duration, Utc};
use rand::Rng;

use crate::models::candle::{Candle, CandleSeries, Interval, Range};

/// One static record. Slices are empty rather than optional so call sites
/// can iterate without unwrapping.
#[derive(Debug)]
pub struct FallbackRecord {
    pub symbol: &'static str,
    pub name: &'static str,
    pub price: f64,
    pub description: Option<&'static str>,
    pub sector: Option<&'static str>,
    pub market_cap: Option<&'static str>,
    pub pe_ratio: Option<&'static str>,
    pub ir_website: Option<&'static str>,
    /// (period label, document link)
    pub earnings: &'static [(&'static str, &'static str)],
    /// (headline, publisher, age)
    pub news: &'static [(&'static str, &'static str, &'static str)],
    pub fin_years: &'static [&'static str],
    pub fin_revenue: &'static [f64],
    pub fin_net_income: &'static [f64],
    pub fin_eps: &'static [f64],
    /// Reference closes used to synthesize a chart when the API is down.
    pub chart_closes: &'static [f64],
}

const TABLE: &[FallbackRecord] = &[
    FallbackRecord {
        symbol: "AAPL",
        name: "Apple Inc.",
        price: 185.92,
        description: None,
        sector: None,
        market_cap: None,
        pe_ratio: None,
        ir_website: None,
        earnings: &[],
        news: &[],
        fin_years: &[],
        fin_revenue: &[],
        fin_net_income: &[],
        fin_eps: &[],
        chart_closes: &[],
    },
    FallbackRecord {
        symbol: "TSLA",
        name: "Tesla, Inc.",
        price: 238.45,
        description: None,
        sector: None,
        market_cap: None,
        pe_ratio: None,
        ir_website: None,
        earnings: &[],
        news: &[],
        fin_years: &[],
        fin_revenue: &[],
        fin_net_income: &[],
        fin_eps: &[],
        chart_closes: &[],
    },
    FallbackRecord {
        symbol: "NVDA",
        name: "NVIDIA Corp.",
        price: 522.53,
        description: Some(
            "NVIDIA designs graphics processing units for gaming and accelerated \
             computing, and system-on-chip units for data center platforms.",
        ),
        sector: Some("Technology"),
        market_cap: Some("1.29T"),
        pe_ratio: Some("45.2x"),
        ir_website: Some("https://investor.nvidia.com"),
        earnings: &[("2024 Q1", "#"), ("2023 Q4", "#")],
        news: &[
            (
                "NVIDIA unveils next-generation AI chips on the Blackwell architecture",
                "The Verge",
                "1h ago",
            ),
            (
                "GPU demand from cloud service providers keeps surging",
                "WSJ",
                "4h ago",
            ),
        ],
        fin_years: &["2020", "2021", "2022", "2023", "2024"],
        fin_revenue: &[10.9e9, 16.7e9, 26.9e9, 27.0e9, 60.9e9],
        fin_net_income: &[2.8e9, 4.3e9, 9.7e9, 4.4e9, 29.7e9],
        fin_eps: &[1.13, 1.73, 3.85, 1.74, 11.93],
        chart_closes: &[300.0, 350.0, 420.0, 410.0, 480.0, 510.0, 522.53],
    },
];

/// Case-insensitive table lookup.
pub fn lookup(symbol: &str) -> Option<&'static FallbackRecord> {
    TABLE
        .iter()
        .find(|r| r.symbol.eq_ignore_ascii_case(symbol.trim()))
}

/// Builds a daily series around the record's reference closes, one candle
/// per close, dated backwards from today. Open/high/low are jittered within
/// 2% of the close; volume is unknown and stays zero. Returns `None` when
/// the record carries no reference closes.
pub fn synthetic_series(
    record: &FallbackRecord,
    range: Range,
    interval: Interval,
) -> Option<CandleSeries> {
    if record.chart_closes.is_empty() {
        return None;
    }

    let mut rng = rand::rng();
    let now = Utc::now();
    let count = record.chart_closes.len();

    let mut series = CandleSeries::new(record.symbol, range, interval);
    for (i, &close) in record.chart_closes.iter().enumerate() {
        let volatility = close * 0.02;
        let open = close + (rng.random_range(0.0..1.0) - 0.5) * volatility;
        let high = open.max(close) + rng.random_range(0.0..1.0) * volatility;
        let low = open.min(close) - rng.random_range(0.0..1.0) * volatility;
        let ts = now - Duration::days((count - 1 - i) as i64);
        series.push(Candle::new(ts, open, high, low, close, 0));
    }
    Some(series)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(lookup("nvda").is_some());
        assert!(lookup(" NVDA ").is_some());
        assert!(lookup("ZZZZ").is_none());
    }

    #[test]
    fn test_partial_records_have_name_and_price_only() {
        let record = lookup("AAPL").unwrap();
        assert_eq!(record.name, "Apple Inc.");
        assert!((record.price - 185.92).abs() < 1e-9);
        assert!(record.sector.is_none());
        assert!(record.chart_closes.is_empty());
    }

    #[test]
    fn test_full_record_financials_are_aligned() {
        let record = lookup("NVDA").unwrap();
        assert_eq!(record.fin_years.len(), record.fin_revenue.len());
        assert_eq!(record.fin_years.len(), record.fin_net_income.len());
        assert_eq!(record.fin_years.len(), record.fin_eps.len());
    }

    #[test]
    fn test_synthetic_series_brackets_each_close() {
        let record = lookup("NVDA").unwrap();
        let series = synthetic_series(record, Range::OneYear, Interval::Daily).unwrap();

        assert_eq!(series.len(), record.chart_closes.len());
        for (candle, &close) in series.candles.iter().zip(record.chart_closes) {
            assert!((candle.close - close).abs() < 1e-9);
            assert!(candle.high >= candle.open.max(candle.close));
            assert!(candle.low <= candle.open.min(candle.close));
            // Jitter stays within the 2% band around the close.
            assert!(candle.high <= close * 1.05);
            assert!(candle.low >= close * 0.95);
        }
        // Candles run oldest to newest, one day apart.
        for pair in series.candles.windows(2) {
            assert!(pair[0].ts < pair[1].ts);
        }
        assert_eq!(series.last_close(), Some(522.53));
    }

    #[test]
    fn test_synthetic_series_requires_reference_closes() {
        let record = lookup("TSLA").unwrap();
        assert!(synthetic_series(record, Range::OneYear, Interval::Daily).is_none());
    }
}
