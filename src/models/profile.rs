// ============================================================================
// Quote profile: the resolved ticker card
// ============================================================================
// Every field goes through the same three-tier chain, independently:
// live API value (present and non-empty) -> fallback table -> placeholder.
// The resolved struct keeps unresolved fields as None; placeholders are
// applied by the display helpers, never stored.

use crate::fallback::FallbackRecord;

/// Placeholder for card fields with no live or fallback value.
pub const FIELD_PENDING: &str = "-";
/// Placeholder for the price when no source has one.
pub const PRICE_PENDING: &str = "Data pending...";
/// Placeholder for a missing business description.
pub const DESCRIPTION_PENDING: &str = "No company description available yet.";

/// Descriptions longer than this are cut for the card view.
const DESCRIPTION_LIMIT: usize = 150;

/// Profile fields as the API returned them, all optional.
#[derive(Debug, Clone, Default)]
pub struct LiveProfile {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub previous_close: Option<f64>,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub website: Option<String>,
    pub ir_website: Option<String>,
    pub description: Option<String>,
}

/// The resolved ticker card.
#[derive(Debug, Clone)]
pub struct QuoteProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub change_abs: Option<f64>,
    pub change_pct: Option<f64>,
    pub sector: Option<String>,
    /// Display form: live caps are formatted, fallback caps are verbatim.
    pub market_cap: Option<String>,
    pub pe_ratio: Option<String>,
    pub website: Option<String>,
    pub ir_website: Option<String>,
    pub description: Option<String>,
}

impl QuoteProfile {
    /// Applies the three-tier chain field by field.
    ///
    /// The change is only derivable from live data (price vs previous
    /// close); the fallback table carries a reference price but no prior
    /// close, so a dead API leaves the change unresolved.
    pub fn resolve(
        symbol: &str,
        live: Option<&LiveProfile>,
        fallback: Option<&FallbackRecord>,
    ) -> Self {
        let (change_abs, change_pct) = live
            .and_then(|l| {
                let price = l.price?;
                let prev = l.previous_close.filter(|p| *p != 0.0)?;
                let abs = price - prev;
                Some((abs, abs / prev * 100.0))
            })
            .map(|(a, p)| (Some(a), Some(p)))
            .unwrap_or((None, None));

        Self {
            symbol: symbol.to_string(),
            name: pick_text(live.and_then(|l| l.name.as_deref()), fallback.map(|f| f.name)),
            price: live
                .and_then(|l| l.price)
                .or(fallback.map(|f| f.price)),
            change_abs,
            change_pct,
            sector: pick_text(
                live.and_then(|l| l.sector.as_deref()),
                fallback.and_then(|f| f.sector),
            ),
            market_cap: live
                .and_then(|l| l.market_cap)
                .map(format_market_cap)
                .or_else(|| fallback.and_then(|f| f.market_cap).map(str::to_string)),
            pe_ratio: live
                .and_then(|l| l.pe_ratio)
                .map(|pe| format!("{:.2}", pe))
                .or_else(|| fallback.and_then(|f| f.pe_ratio).map(str::to_string)),
            website: pick_text(live.and_then(|l| l.website.as_deref()), None),
            ir_website: pick_text(
                live.and_then(|l| l.ir_website.as_deref()),
                fallback.and_then(|f| f.ir_website),
            ),
            description: pick_text(
                live.and_then(|l| l.description.as_deref()),
                fallback.and_then(|f| f.description),
            ),
        }
    }

    /// Company name, or the symbol itself while unresolved.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbol)
    }

    pub fn price_text(&self) -> String {
        match self.price {
            Some(p) => format!("${:.2}", p),
            None => PRICE_PENDING.to_string(),
        }
    }

    pub fn change_text(&self) -> String {
        match (self.change_abs, self.change_pct) {
            (Some(abs), Some(pct)) => {
                let arrow = if abs >= 0.0 { "▲" } else { "▼" };
                format!("{} {:+.2} ({:+.2}%)", arrow, abs, pct)
            }
            _ => FIELD_PENDING.to_string(),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.change_abs.map(|c| c >= 0.0).unwrap_or(true)
    }

    pub fn sector_text(&self) -> &str {
        self.sector.as_deref().unwrap_or(FIELD_PENDING)
    }

    pub fn market_cap_text(&self) -> &str {
        self.market_cap.as_deref().unwrap_or(FIELD_PENDING)
    }

    pub fn pe_text(&self) -> &str {
        self.pe_ratio.as_deref().unwrap_or(FIELD_PENDING)
    }

    pub fn website_text(&self) -> &str {
        self.website.as_deref().unwrap_or(FIELD_PENDING)
    }

    pub fn ir_website_text(&self) -> &str {
        self.ir_website
            .as_deref()
            .or(self.website.as_deref())
            .unwrap_or(FIELD_PENDING)
    }

    /// Description cut to the card limit, with an ellipsis when truncated.
    pub fn description_text(&self) -> String {
        match self.description.as_deref() {
            Some(desc) => {
                if desc.chars().count() > DESCRIPTION_LIMIT {
                    let cut: String = desc.chars().take(DESCRIPTION_LIMIT).collect();
                    format!("{}…", cut.trim_end())
                } else {
                    desc.to_string()
                }
            }
            None => DESCRIPTION_PENDING.to_string(),
        }
    }
}

/// Live text wins only when it is present and non-empty.
fn pick_text(live: Option<&str>, fallback: Option<&str>) -> Option<String> {
    live.filter(|s| !s.trim().is_empty())
        .or(fallback)
        .map(str::to_string)
}

/// Compact market-cap display: 1.29T, 87.40B, 5.12M.
pub fn format_market_cap(raw: f64) -> String {
    if raw >= 1e12 {
        format!("{:.2}T", raw / 1e12)
    } else if raw >= 1e9 {
        format!("{:.2}B", raw / 1e9)
    } else if raw >= 1e6 {
        format!("{:.2}M", raw / 1e6)
    } else {
        format!("{:.0}", raw)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;

    #[test]
    fn test_unknown_symbol_renders_placeholders() {
        // No live data, no fallback entry: every field shows its placeholder.
        let profile = QuoteProfile::resolve("ZZZZ", None, fallback::lookup("ZZZZ"));

        assert_eq!(profile.display_name(), "ZZZZ");
        assert_eq!(profile.price_text(), PRICE_PENDING);
        assert_eq!(profile.change_text(), FIELD_PENDING);
        assert_eq!(profile.sector_text(), FIELD_PENDING);
        assert_eq!(profile.market_cap_text(), FIELD_PENDING);
        assert_eq!(profile.pe_text(), FIELD_PENDING);
        assert_eq!(profile.description_text(), DESCRIPTION_PENDING);
    }

    #[test]
    fn test_partial_live_overrides_fallback_per_field() {
        // Live has only a price; name and sector come from the table.
        let live = LiveProfile {
            price: Some(600.0),
            ..Default::default()
        };
        let record = fallback::lookup("NVDA").expect("table entry");
        let profile = QuoteProfile::resolve("NVDA", Some(&live), Some(record));

        assert_eq!(profile.price, Some(600.0));
        assert_eq!(profile.display_name(), "NVIDIA Corp.");
        assert_eq!(profile.sector_text(), "Technology");
        assert_eq!(profile.market_cap_text(), "1.29T");
        // Change needs a live previous close; a partial record leaves it
        // unresolved rather than inventing one.
        assert_eq!(profile.change_text(), FIELD_PENDING);
    }

    #[test]
    fn test_live_fields_win_over_fallback() {
        let live = LiveProfile {
            name: Some("NVIDIA Corporation".into()),
            price: Some(610.0),
            previous_close: Some(600.0),
            sector: Some("Semiconductors".into()),
            market_cap: Some(1_500_000_000_000.0),
            pe_ratio: Some(44.21),
            ..Default::default()
        };
        let record = fallback::lookup("NVDA").expect("table entry");
        let profile = QuoteProfile::resolve("NVDA", Some(&live), Some(record));

        assert_eq!(profile.display_name(), "NVIDIA Corporation");
        assert_eq!(profile.sector_text(), "Semiconductors");
        assert_eq!(profile.market_cap_text(), "1.50T");
        assert_eq!(profile.pe_text(), "44.21");

        let (abs, pct) = (profile.change_abs.unwrap(), profile.change_pct.unwrap());
        assert!((abs - 10.0).abs() < 1e-9);
        assert!((pct - 10.0 / 600.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_live_string_is_treated_as_missing() {
        let live = LiveProfile {
            name: Some("   ".into()),
            ..Default::default()
        };
        let record = fallback::lookup("NVDA").expect("table entry");
        let profile = QuoteProfile::resolve("NVDA", Some(&live), Some(record));
        assert_eq!(profile.display_name(), "NVIDIA Corp.");
    }

    #[test]
    fn test_market_cap_tiers() {
        assert_eq!(format_market_cap(1_290_000_000_000.0), "1.29T");
        assert_eq!(format_market_cap(87_400_000_000.0), "87.40B");
        assert_eq!(format_market_cap(5_120_000.0), "5.12M");
        assert_eq!(format_market_cap(950_000.0), "950000");
    }

    #[test]
    fn test_description_truncation() {
        let long = "x".repeat(200);
        let profile = QuoteProfile {
            symbol: "T".into(),
            name: None,
            price: None,
            change_abs: None,
            change_pct: None,
            sector: None,
            market_cap: None,
            pe_ratio: None,
            website: None,
            ir_website: None,
            description: Some(long),
        };
        let text = profile.description_text();
        assert!(text.ends_with('…'));
        assert_eq!(text.chars().count(), 151);
    }
}
