// ============================================================================
// Module : api
// ============================================================================
// HTTP clients for the upstream data sources: quotes and candles, company
// profiles, news, financial statements and the earnings-document server.
// ============================================================================

pub mod chart;
pub mod client;
pub mod earnings;
pub mod financials;
pub mod news;
pub mod profile;

// Re-exports of the fetch entry points.
pub use chart::{fetch_daily_series, fetch_quote, TickerQuote};
pub use earnings::fetch_earnings_docs;
pub use financials::fetch_financials;
pub use news::fetch_news;
pub use profile::fetch_profile;

use serde::Deserialize;

/// Numeric fields arrive wrapped as `{"raw": 45.2, "fmt": "45.2"}`; only
/// the raw value is read.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawValue {
    pub raw: Option<f64>,
}
