// ============================================================================
// API Client : financial statements
// ============================================================================
// Two upstream calls: the fundamentals timeseries for reported figures and
// quoteSummary's earningsTrend for analyst estimates. Each timeseries
// result carries one metric, keyed by the name in its own meta, so the
// payload is folded metric by metric into per-period rows before the table
// math runs.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::api::client::get_json;
use crate::api::RawValue;
use crate::models::financials::{
    fiscal_year_label, next_quarter_label, quarter_label, FinancialPeriod, FinancialStatements,
    RawPeriod,
};

/// Metric stems requested in both annual and quarterly flavors. EBITDA and
/// EPS each have a backup stem filling in when the primary is absent.
const METRIC_STEMS: &[&str] = &[
    "TotalRevenue",
    "GrossProfit",
    "EBITDA",
    "NormalizedEBITDA",
    "NetIncome",
    "BasicEPS",
    "DilutedEPS",
    "OperatingCashFlow",
    "CapitalExpenditure",
];

const ANNUAL_COLUMNS: usize = 5;
const QUARTERLY_COLUMNS: usize = 8;

// ============================================================================
// Response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesEnvelope,
}

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    result: Option<Vec<TimeseriesResult>>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    /// The metric array sits under a key equal to `meta.type[0]`, so it is
    /// captured loose and decoded once the key is known.
    #[serde(flatten)]
    series: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataPoint {
    as_of_date: Option<String>,
    reported_value: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendResponse {
    quote_summary: TrendEnvelope,
}

#[derive(Debug, Deserialize)]
struct TrendEnvelope {
    result: Option<Vec<TrendResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendResult {
    earnings_trend: Option<EarningsTrend>,
}

#[derive(Debug, Deserialize)]
struct EarningsTrend {
    #[serde(default)]
    trend: Vec<TrendEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrendEntry {
    period: Option<String>,
    revenue_estimate: Option<EstimateBlock>,
    earnings_estimate: Option<EstimateBlock>,
}

#[derive(Debug, Deserialize)]
struct EstimateBlock {
    avg: Option<RawValue>,
}

/// One analyst estimate, keyed by the upstream period code ("0y", "+1q").
#[derive(Debug, Clone)]
struct TrendEstimate {
    period: String,
    revenue: Option<f64>,
    eps: Option<f64>,
}

// ============================================================================
// Fetch functions
// ============================================================================

/// Fetches and derives the full statement tables for a symbol.
#[instrument(skip(client, api_base))]
pub async fn fetch_financials(
    client: &reqwest::Client,
    api_base: &str,
    symbol: &str,
) -> Result<FinancialStatements> {
    let url = build_timeseries_url(api_base, symbol, Utc::now());
    debug!(url = %url, "built timeseries URL");

    let response: TimeseriesResponse = get_json(client, &url).await?;
    let (annual, quarterly) = collect_periods(response);

    // Estimates are additive; losing them never sinks the reported table.
    let estimates = match fetch_estimates(client, api_base, symbol).await {
        Ok(estimates) => estimates,
        Err(err) => {
            warn!(error = %err, "estimates unavailable, keeping reported figures only");
            Vec::new()
        }
    };

    let statements = build_statements(annual, quarterly, &estimates);
    if statements.is_empty() {
        anyhow::bail!("no financial data for {}", symbol);
    }

    info!(
        annual = statements.annual.len(),
        quarterly = statements.quarterly.len(),
        "fetched financials"
    );
    Ok(statements)
}

async fn fetch_estimates(
    client: &reqwest::Client,
    api_base: &str,
    symbol: &str,
) -> Result<Vec<TrendEstimate>> {
    let url = format!(
        "{}/v10/finance/quoteSummary/{}?modules=earningsTrend",
        api_base, symbol
    );
    let response: TrendResponse = get_json(client, &url).await?;

    let trend = response
        .quote_summary
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|r| r.earnings_trend)
        .context("no earningsTrend in response")?;

    Ok(trend
        .trend
        .into_iter()
        .filter_map(|entry| {
            Some(TrendEstimate {
                period: entry.period?,
                revenue: entry.revenue_estimate.and_then(|e| e.avg).and_then(|v| v.raw),
                eps: entry.earnings_estimate.and_then(|e| e.avg).and_then(|v| v.raw),
            })
        })
        .collect())
}

fn build_timeseries_url(api_base: &str, symbol: &str, now: DateTime<Utc>) -> String {
    let types: Vec<String> = METRIC_STEMS
        .iter()
        .flat_map(|stem| [format!("annual{}", stem), format!("quarterly{}", stem)])
        .collect();
    // Six years back covers five annual columns plus a predecessor for
    // growth, and the quarterly window with room to spare.
    let period1 = now.timestamp() - 6 * 365 * 86_400;
    format!(
        "{}/ws/fundamentals-timeseries/v1/finance/timeseries/{}?symbol={}&type={}&period1={}&period2={}",
        api_base,
        symbol,
        symbol,
        types.join(","),
        period1,
        now.timestamp()
    )
}

// ============================================================================
// Folding and table assembly
// ============================================================================

type PeriodMap = BTreeMap<NaiveDate, RawPeriod>;

fn collect_periods(response: TimeseriesResponse) -> (PeriodMap, PeriodMap) {
    let mut annual = PeriodMap::new();
    let mut quarterly = PeriodMap::new();

    for result in response.timeseries.result.unwrap_or_default() {
        let Some(metric) = result.meta.types.first() else {
            continue;
        };
        let (map, stem) = if let Some(stem) = metric.strip_prefix("annual") {
            (&mut annual, stem)
        } else if let Some(stem) = metric.strip_prefix("quarterly") {
            (&mut quarterly, stem)
        } else {
            continue;
        };

        let Some(raw_points) = result.series.get(metric) else {
            continue;
        };
        let points: Vec<Option<DataPoint>> =
            serde_json::from_value(raw_points.clone()).unwrap_or_default();

        for point in points.into_iter().flatten() {
            let Some(date) = point
                .as_of_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            let Some(value) = point.reported_value.and_then(|v| v.raw) else {
                continue;
            };
            let row = map.entry(date).or_insert_with(|| RawPeriod {
                end: date,
                ..Default::default()
            });
            apply_metric(row, stem, value);
        }
    }

    (annual, quarterly)
}

/// Assigns a metric value to its row. Backup stems (normalized EBITDA,
/// diluted EPS) only fill gaps the primary left.
fn apply_metric(row: &mut RawPeriod, stem: &str, value: f64) {
    match stem {
        "TotalRevenue" => row.revenue = Some(value),
        "GrossProfit" => row.gross_profit = Some(value),
        "EBITDA" => row.ebitda = Some(value),
        "NormalizedEBITDA" => row.ebitda = row.ebitda.or(Some(value)),
        "NetIncome" => row.net_income = Some(value),
        "BasicEPS" => row.eps = Some(value),
        "DilutedEPS" => row.eps = row.eps.or(Some(value)),
        "OperatingCashFlow" => row.operating_cash_flow = Some(value),
        "CapitalExpenditure" => row.capital_expenditure = Some(value),
        _ => {}
    }
}

fn build_statements(
    annual: PeriodMap,
    quarterly: PeriodMap,
    estimates: &[TrendEstimate],
) -> FinancialStatements {
    FinancialStatements {
        annual: build_annual(annual, estimates),
        quarterly: build_quarterly(quarterly, estimates),
    }
}

fn build_annual(map: PeriodMap, estimates: &[TrendEstimate]) -> Vec<FinancialPeriod> {
    let all: Vec<RawPeriod> = map.into_values().collect();
    // Keep the newest columns; the oldest shown one has no predecessor so
    // its growth stays blank.
    let window = &all[all.len().saturating_sub(ANNUAL_COLUMNS)..];

    let mut periods: Vec<FinancialPeriod> = window
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let prev = if i > 0 { Some(&window[i - 1]) } else { None };
            FinancialPeriod::historical(fiscal_year_label(raw.end), raw, prev)
        })
        .collect();

    // Annual estimates are labelled as calendar years following the newest
    // reported one.
    if let Some(last_cy) = window
        .last()
        .and_then(|raw| fiscal_year_label(raw.end).parse::<i32>().ok())
    {
        for estimate in estimates {
            let offset = match estimate.period.as_str() {
                "0y" => 1,
                "+1y" => 2,
                "+2y" => 3,
                "+3y" => 4,
                "+4y" => 5,
                _ => continue,
            };
            if estimate.revenue.is_some() || estimate.eps.is_some() {
                periods.push(FinancialPeriod::estimate(
                    (last_cy + offset).to_string(),
                    estimate.revenue,
                    estimate.eps,
                ));
            }
        }
    }

    periods.sort_by(|a, b| a.label.cmp(&b.label));
    periods
}

fn build_quarterly(map: PeriodMap, estimates: &[TrendEstimate]) -> Vec<FinancialPeriod> {
    let all: Vec<RawPeriod> = map.into_values().collect();

    // Growth is computed against the full history before the window is
    // cut, so even the oldest shown quarter can have a rate.
    let mut periods: Vec<FinancialPeriod> = all
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let prev = if i > 0 { Some(&all[i - 1]) } else { None };
            FinancialPeriod::historical(quarter_label(raw.end), raw, prev)
        })
        .collect();
    periods.drain(..periods.len().saturating_sub(QUARTERLY_COLUMNS));

    if let Some(last_label) = periods.last().map(|p| p.label.clone()) {
        let mut label = last_label;
        for period_code in ["0q", "+1q", "+2q", "+3q", "+4q"] {
            let Some(estimate) = estimates.iter().find(|e| e.period == period_code) else {
                continue;
            };
            label = next_quarter_label(&label);
            // Quarterly estimate columns need both figures to be worth a
            // column.
            if estimate.revenue.is_some() && estimate.eps.is_some() {
                periods.push(FinancialPeriod::estimate(
                    label.clone(),
                    estimate.revenue,
                    estimate.eps,
                ));
            }
        }
    }

    periods.sort_by(|a, b| a.label.cmp(&b.label));
    periods
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_timeseries_url() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let url = build_timeseries_url("https://query1.finance.yahoo.com", "NVDA", now);
        assert!(url.contains("/ws/fundamentals-timeseries/v1/finance/timeseries/NVDA"));
        assert!(url.contains("symbol=NVDA"));
        assert!(url.contains("annualTotalRevenue"));
        assert!(url.contains("quarterlyBasicEPS"));
        assert!(url.contains("period2=1700000000"));
    }

    #[test]
    fn test_collect_periods_folds_metrics_by_date() {
        let raw = r#"{"timeseries": {"result": [
            {"meta": {"type": ["annualTotalRevenue"]},
             "timestamp": [1643587200, 1675123200],
             "annualTotalRevenue": [
                {"asOfDate": "2022-01-30", "reportedValue": {"raw": 26900000000.0}},
                {"asOfDate": "2023-01-29", "reportedValue": {"raw": 27000000000.0}}
             ]},
            {"meta": {"type": ["annualBasicEPS"]},
             "annualBasicEPS": [
                {"asOfDate": "2022-01-30", "reportedValue": {"raw": 3.85}},
                null
             ]},
            {"meta": {"type": ["quarterlyTotalRevenue"]},
             "quarterlyTotalRevenue": [
                {"asOfDate": "2023-10-29", "reportedValue": {"raw": 18120000000.0}}
             ]}
        ]}}"#;
        let response: TimeseriesResponse = serde_json::from_str(raw).unwrap();
        let (annual, quarterly) = collect_periods(response);

        assert_eq!(annual.len(), 2);
        let row = &annual[&date(2022, 1, 30)];
        assert_eq!(row.revenue, Some(26.9e9));
        assert_eq!(row.eps, Some(3.85));
        assert!(annual[&date(2023, 1, 29)].eps.is_none());
        assert_eq!(quarterly.len(), 1);
    }

    #[test]
    fn test_backup_stems_only_fill_gaps() {
        let mut row = RawPeriod::default();
        apply_metric(&mut row, "NormalizedEBITDA", 10.0);
        assert_eq!(row.ebitda, Some(10.0));
        apply_metric(&mut row, "EBITDA", 12.0);
        assert_eq!(row.ebitda, Some(12.0));
        apply_metric(&mut row, "NormalizedEBITDA", 11.0);
        assert_eq!(row.ebitda, Some(12.0));

        apply_metric(&mut row, "DilutedEPS", 1.0);
        apply_metric(&mut row, "BasicEPS", 1.2);
        assert_eq!(row.eps, Some(1.2));
    }

    #[test]
    fn test_build_annual_labels_and_estimates() {
        let mut map = PeriodMap::new();
        for (end, revenue) in [
            (date(2022, 1, 30), 26.9e9),
            (date(2023, 1, 29), 27.0e9),
            (date(2024, 1, 28), 60.9e9),
        ] {
            map.insert(
                end,
                RawPeriod {
                    end,
                    revenue: Some(revenue),
                    ..Default::default()
                },
            );
        }
        let estimates = vec![
            TrendEstimate {
                period: "0y".into(),
                revenue: Some(120.0e9),
                eps: Some(2.95),
            },
            TrendEstimate {
                period: "+1y".into(),
                revenue: Some(170.0e9),
                eps: None,
            },
            TrendEstimate {
                period: "0q".into(),
                revenue: Some(30.0e9),
                eps: Some(0.8),
            },
        ];

        let periods = build_annual(map, &estimates);
        let labels: Vec<&str> = periods.iter().map(|p| p.label.as_str()).collect();
        // Fiscal years ending in January belong to the prior calendar year.
        assert_eq!(labels, vec!["2021", "2022", "2023", "2024E", "2025E"]);

        assert!(periods[0].revenue_growth.is_none());
        let growth = periods[2].revenue_growth.unwrap();
        assert!((growth - (60.9 - 27.0) / 27.0 * 100.0).abs() < 1e-6);
        assert!(periods[3].is_estimate);
    }

    #[test]
    fn test_build_quarterly_chains_estimate_labels() {
        let mut map = PeriodMap::new();
        for end in [date(2024, 7, 28), date(2024, 10, 27)] {
            map.insert(
                end,
                RawPeriod {
                    end,
                    revenue: Some(30.0e9),
                    eps: Some(0.7),
                    ..Default::default()
                },
            );
        }
        let estimates = vec![
            TrendEstimate {
                period: "0q".into(),
                revenue: Some(38.0e9),
                eps: Some(0.85),
            },
            // Missing EPS: skipped, but still advances the label.
            TrendEstimate {
                period: "+1q".into(),
                revenue: Some(41.0e9),
                eps: None,
            },
        ];

        let periods = build_quarterly(map, &estimates);
        let labels: Vec<&str> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-Q2", "2024-Q3", "2024-Q4E"]);
        assert!(periods[1].revenue_growth.is_some());
    }

    #[test]
    fn test_window_truncation() {
        let mut map = PeriodMap::new();
        for year in 2015..2023 {
            let end = date(year, 12, 31);
            map.insert(
                end,
                RawPeriod {
                    end,
                    revenue: Some(1.0e9 * (year - 2014) as f64),
                    ..Default::default()
                },
            );
        }
        let periods = build_annual(map, &[]);
        assert_eq!(periods.len(), ANNUAL_COLUMNS);
        assert_eq!(periods[0].label, "2018");
        // Oldest displayed year lost its predecessor with the cut.
        assert!(periods[0].revenue_growth.is_none());
    }

    #[tokio::test]
    async fn test_fetch_financials_live() {
        let client = crate::api::client::build(10).unwrap();
        match fetch_financials(&client, "https://query1.finance.yahoo.com", "AAPL").await {
            Ok(statements) => {
                assert!(!statements.annual.is_empty());
                println!(
                    "✓ fetched {} annual / {} quarterly columns",
                    statements.annual.len(),
                    statements.quarterly.len()
                );
            }
            Err(e) => println!("⚠ skipped (offline?): {}", e),
        }
    }
}
