// ============================================================================
// API Client : historical prices
// ============================================================================
// Wraps the v8 chart endpoint. The endpoint is always queried at daily
// resolution; weekly and monthly views are derived locally so the upstream
// contract stays one-shaped.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::api::client::get_json;
use crate::models::candle::{Candle, CandleSeries, Interval, Range};

// ============================================================================
// Response shape
// ============================================================================
// Only the fields we read are declared; everything else in the payload is
// ignored. Price arrays are per-row nullable, matching the wire format.

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteArrays>,
}

#[derive(Debug, Deserialize)]
struct QuoteArrays {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

/// Lightweight quote for the watchlist refresh: last price plus the name
/// the upstream knows the symbol by.
#[derive(Debug, Clone)]
pub struct TickerQuote {
    pub symbol: String,
    pub price: f64,
    pub name: Option<String>,
}

// ============================================================================
// Fetch functions
// ============================================================================

/// Fetches the daily candle series for a symbol over a range.
#[instrument(skip(client, api_base), fields(range = %range.label()))]
pub async fn fetch_daily_series(
    client: &reqwest::Client,
    api_base: &str,
    symbol: &str,
    range: Range,
) -> Result<CandleSeries> {
    let url = build_chart_url(api_base, symbol, range, Utc::now());
    debug!(url = %url, "built chart URL");

    let response: ChartResponse = get_json(client, &url).await?;
    let series = parse_chart_response(response, symbol, range)?;

    info!(candles = series.len(), "fetched daily series");
    Ok(series)
}

/// Fetches just enough to update one watchlist row. A month of dailies is
/// the smallest window the endpoint serves reliably.
#[instrument(skip(client, api_base))]
pub async fn fetch_quote(
    client: &reqwest::Client,
    api_base: &str,
    symbol: &str,
) -> Result<TickerQuote> {
    let url = build_chart_url(api_base, symbol, Range::OneMonth, Utc::now());
    let response: ChartResponse = get_json(client, &url).await?;

    let result = first_result(response)?;
    let name = result.meta.short_name.clone();

    // Prefer the meta price; fall back to the newest parseable close.
    let price = match result.meta.regular_market_price {
        Some(price) => price,
        None => parse_chart_result(result, symbol, Range::OneMonth)?
            .last_close()
            .context("no price in chart response")?,
    };

    Ok(TickerQuote {
        symbol: symbol.to_uppercase(),
        price,
        name,
    })
}

fn build_chart_url(api_base: &str, symbol: &str, range: Range, now: DateTime<Utc>) -> String {
    let period1 = range.start_timestamp(now);
    let period2 = now.timestamp();
    format!(
        "{}/v8/finance/chart/{}?interval=1d&period1={}&period2={}",
        api_base, symbol, period1, period2
    )
}

fn first_result(response: ChartResponse) -> Result<ChartResult> {
    response
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .context("empty chart response")
}

fn parse_chart_response(
    response: ChartResponse,
    symbol: &str,
    range: Range,
) -> Result<CandleSeries> {
    parse_chart_result(first_result(response)?, symbol, range)
}

/// Converts the columnar arrays into candles. Rows with any missing price
/// component are skipped rather than zero-filled; a missing volume is zero.
fn parse_chart_result(result: ChartResult, symbol: &str, range: Range) -> Result<CandleSeries> {
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .context("no quote arrays in chart response")?;

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let mut series = CandleSeries::new(symbol, range, Interval::Daily);
    let mut skipped = 0;

    for (i, &timestamp) in timestamps.iter().enumerate() {
        let row = (
            opens.get(i).and_then(|&v| v),
            highs.get(i).and_then(|&v| v),
            lows.get(i).and_then(|&v| v),
            closes.get(i).and_then(|&v| v),
        );
        let (open, high, low, close) = match row {
            (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
            _ => {
                skipped += 1;
                continue;
            }
        };
        let volume = volumes.get(i).and_then(|&v| v).unwrap_or(0);

        let ts = DateTime::from_timestamp(timestamp, 0).context("invalid timestamp")?;
        series.push(Candle::new(ts, open, high, low, close, volume));
    }

    if skipped > 0 {
        warn!(
            skipped,
            total = timestamps.len(),
            "skipped candles with missing data"
        );
    }
    if series.is_empty() {
        anyhow::bail!("no usable candles for {}", symbol);
    }

    Ok(series)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"regularMarketPrice": 522.53, "shortName": "NVIDIA Corporation"},
                "timestamp": [1704153600, 1704240000, 1704326400],
                "indicators": {
                    "quote": [{
                        "open":   [480.0, 485.5, null],
                        "high":   [490.0, 495.0, 500.0],
                        "low":    [478.0, 481.0, 482.0],
                        "close":  [488.0, 493.2, 498.1],
                        "volume": [1000, null, 3000]
                    }]
                }
            }]
        }
    }"#;

    #[test]
    fn test_build_chart_url() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let url = build_chart_url(
            "https://query1.finance.yahoo.com",
            "NVDA",
            Range::OneMonth,
            now,
        );
        assert!(url.contains("/v8/finance/chart/NVDA"));
        assert!(url.contains("interval=1d"));
        assert!(url.contains(&format!("period1={}", 1_700_000_000 - 30 * 86_400)));
        assert!(url.contains("period2=1700000000"));
    }

    #[test]
    fn test_parse_skips_incomplete_rows() {
        let response: ChartResponse = serde_json::from_str(FIXTURE).unwrap();
        let series = parse_chart_response(response, "NVDA", Range::OneMonth).unwrap();

        // Third row has a null open and is dropped.
        assert_eq!(series.len(), 2);
        assert_eq!(series.candles[0].close, 488.0);
        // Null volume becomes zero, not a dropped row.
        assert_eq!(series.candles[1].volume, 0);
    }

    #[test]
    fn test_parse_rejects_all_null_payload() {
        let raw = r#"{"chart": {"result": [{
            "meta": {},
            "timestamp": [1704153600],
            "indicators": {"quote": [{
                "open": [null], "high": [null], "low": [null],
                "close": [null], "volume": [null]
            }]}
        }]}}"#;
        let response: ChartResponse = serde_json::from_str(raw).unwrap();
        assert!(parse_chart_response(response, "NVDA", Range::OneMonth).is_err());
    }

    #[test]
    fn test_parse_rejects_null_result() {
        let response: ChartResponse =
            serde_json::from_str(r#"{"chart": {"result": null}}"#).unwrap();
        assert!(parse_chart_response(response, "NVDA", Range::OneMonth).is_err());
    }

    #[tokio::test]
    async fn test_fetch_daily_series_live() {
        // Real network call; tolerated to fail offline.
        let client = crate::api::client::build(10).unwrap();
        match fetch_daily_series(
            &client,
            "https://query1.finance.yahoo.com",
            "AAPL",
            Range::OneMonth,
        )
        .await
        {
            Ok(series) => {
                assert_eq!(series.symbol, "AAPL");
                assert!(!series.is_empty());
                println!("✓ fetched {} candles for AAPL", series.len());
            }
            Err(e) => println!("⚠ skipped (offline?): {}", e),
        }
    }
}
