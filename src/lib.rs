// ============================================================================
// MarketLens - Library
// ============================================================================
// Exposes the modules for the binary and the tests
// ============================================================================

pub mod api;      // Quote, chart, news, earnings and financials clients
pub mod app;      // Application state
pub mod config;   // Endpoints and directories
pub mod fallback; // Built-in reference data for offline rendering
pub mod models;   // Data structures
pub mod series;   // Resampling, moving averages, chart assembly
pub mod store;    // JSON persistence (watchlist, trades, session)
pub mod ui;       // Terminal user interface
