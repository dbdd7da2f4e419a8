// ============================================================================
// Module : ui
// ============================================================================
// Terminal user interface: event polling plus one renderer per screen.
// ============================================================================

pub mod chart;      // Price chart with overlays and volume
pub mod events;     // Keyboard events and key predicates
pub mod financials; // Statement tables
pub mod overview;   // Main screen and the shared frame

// Re-exports to simplify imports
pub use events::{Event, EventHandler};
pub use overview::render;
