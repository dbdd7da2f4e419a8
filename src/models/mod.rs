// ============================================================================
// Module : models
// ============================================================================
// Data structures shared across the API layer, the app state and the UI.
// ============================================================================

pub mod candle;
pub mod earnings;
pub mod financials;
pub mod markers;
pub mod news;
pub mod profile;
pub mod watchlist;

// Re-exports so call sites can write `models::Candle` instead of the full
// path.
pub use candle::{Candle, CandleSeries, Interval, Range};
pub use earnings::EarningsDoc;
pub use financials::{FinancialPeriod, FinancialStatements, RawPeriod};
pub use markers::{TradeKind, TradeLog, TradeMarker};
pub use news::NewsItem;
pub use profile::{LiveProfile, QuoteProfile};
pub use watchlist::{Watchlist, WatchlistEntry};
