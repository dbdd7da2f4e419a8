// ============================================================================
// Financial statement tables: annual and quarterly periods
// ============================================================================
// Periods are labelled in calendar-year terms. Companies whose fiscal year
// ends in January through March report results that mostly cover the
// previous calendar year, so their labels shift back by one.

use chrono::{Datelike, Duration, NaiveDate};

use crate::fallback::FallbackRecord;

/// Raw statement values for one reporting period, as fetched.
#[derive(Debug, Clone, Default)]
pub struct RawPeriod {
    pub end: NaiveDate,
    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub ebitda: Option<f64>,
    pub net_income: Option<f64>,
    pub eps: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditure: Option<f64>,
}

impl RawPeriod {
    /// Capex is reported negative, so free cash flow is the plain sum.
    pub fn free_cash_flow(&self) -> Option<f64> {
        Some(self.operating_cash_flow? + self.capital_expenditure?)
    }
}

/// One table column, fully derived.
#[derive(Debug, Clone)]
pub struct FinancialPeriod {
    pub label: String,
    pub revenue: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub gross_margin: Option<f64>,
    pub ebitda_margin: Option<f64>,
    pub net_income: Option<f64>,
    pub net_margin: Option<f64>,
    pub eps: Option<f64>,
    pub eps_growth: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub fcf_growth: Option<f64>,
    pub is_estimate: bool,
}

impl FinancialPeriod {
    /// Derives a historical column from raw values, with growth rates
    /// against the previous period when one exists.
    pub fn historical(label: String, current: &RawPeriod, previous: Option<&RawPeriod>) -> Self {
        let fcf = current.free_cash_flow();
        let prev_fcf = previous.and_then(|p| p.free_cash_flow());

        Self {
            label,
            revenue: current.revenue,
            revenue_growth: growth(current.revenue, previous.and_then(|p| p.revenue)),
            gross_margin: margin(current.gross_profit, current.revenue),
            ebitda_margin: margin(current.ebitda, current.revenue),
            net_income: current.net_income,
            net_margin: margin(current.net_income, current.revenue),
            eps: current.eps,
            eps_growth: growth(current.eps, previous.and_then(|p| p.eps)),
            free_cash_flow: fcf,
            fcf_growth: growth(fcf, prev_fcf),
            is_estimate: false,
        }
    }

    /// Analyst estimates only carry revenue and EPS. The label gets an E
    /// suffix so estimate columns read apart from reported ones.
    pub fn estimate(label: String, revenue: Option<f64>, eps: Option<f64>) -> Self {
        let label = if label.ends_with('E') {
            label
        } else {
            format!("{}E", label)
        };
        Self {
            label,
            revenue,
            revenue_growth: None,
            gross_margin: None,
            ebitda_margin: None,
            net_income: None,
            net_margin: None,
            eps,
            eps_growth: None,
            free_cash_flow: None,
            fcf_growth: None,
            is_estimate: true,
        }
    }
}

/// Annual and quarterly columns, each oldest first.
#[derive(Debug, Clone, Default)]
pub struct FinancialStatements {
    pub annual: Vec<FinancialPeriod>,
    pub quarterly: Vec<FinancialPeriod>,
}

impl FinancialStatements {
    pub fn is_empty(&self) -> bool {
        self.annual.is_empty() && self.quarterly.is_empty()
    }

    /// Annual columns from a static table record: revenue, net income and
    /// EPS only, no derived rates.
    pub fn from_fallback(record: &FallbackRecord) -> Self {
        let annual = record
            .fin_years
            .iter()
            .enumerate()
            .map(|(i, year)| FinancialPeriod {
                label: year.to_string(),
                revenue: record.fin_revenue.get(i).copied(),
                revenue_growth: None,
                gross_margin: None,
                ebitda_margin: None,
                net_income: record.fin_net_income.get(i).copied(),
                net_margin: None,
                eps: record.fin_eps.get(i).copied(),
                eps_growth: None,
                free_cash_flow: None,
                fcf_growth: None,
                is_estimate: false,
            })
            .collect();
        Self {
            annual,
            quarterly: Vec::new(),
        }
    }
}

/// Calendar-year label for a fiscal period end date.
pub fn fiscal_year_label(end: NaiveDate) -> String {
    let year = if end.month() <= 3 {
        end.year() - 1
    } else {
        end.year()
    };
    year.to_string()
}

/// Calendar-quarter label for a fiscal quarter end date. Stepping back 45
/// days lands inside the quarter the period mostly covers.
pub fn quarter_label(end: NaiveDate) -> String {
    let mid = end - Duration::days(45);
    let quarter = (mid.month() - 1) / 3 + 1;
    format!("{}-Q{}", mid.year(), quarter)
}

/// Quarter label following `label`, wrapping Q4 into the next year. Used to
/// place quarterly estimates after the last reported quarter.
pub fn next_quarter_label(label: &str) -> String {
    let parsed = label
        .trim_end_matches('E')
        .split_once("-Q")
        .and_then(|(y, q)| Some((y.parse::<i32>().ok()?, q.parse::<u32>().ok()?)));
    match parsed {
        Some((year, 4)) => format!("{}-Q1", year + 1),
        Some((year, q)) => format!("{}-Q{}", year, q + 1),
        None => label.to_string(),
    }
}

/// Period-over-period growth in percent. Zero and missing values on either
/// side leave the rate undefined.
pub fn growth(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    let current = current.filter(|v| *v != 0.0)?;
    let previous = previous.filter(|v| *v != 0.0)?;
    Some((current - previous) / previous.abs() * 100.0)
}

fn margin(part: Option<f64>, revenue: Option<f64>) -> Option<f64> {
    let part = part.filter(|v| *v != 0.0)?;
    let revenue = revenue.filter(|v| *v != 0.0)?;
    Some(part / revenue * 100.0)
}

/// Compact signed amount: 60.9B, -1.25B, 522.53M.
pub fn format_amount(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    if abs >= 1e12 {
        format!("{}{:.2}T", sign, abs / 1e12)
    } else if abs >= 1e9 {
        format!("{}{:.2}B", sign, abs / 1e9)
    } else if abs >= 1e6 {
        format!("{}{:.2}M", sign, abs / 1e6)
    } else {
        format!("{}{:.2}", sign, abs)
    }
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
    fn test_fiscal_year_label_shifts_early_enders() {
        // NVIDIA's fiscal 2024 ends in January 2024: mostly calendar 2023.
        assert_eq!(fiscal_year_label(date(2024, 1, 28)), "2023");
        assert_eq!(fiscal_year_label(date(2024, 3, 31)), "2023");
        // April and later stay in their own year.
        assert_eq!(fiscal_year_label(date(2024, 4, 30)), "2024");
        assert_eq!(fiscal_year_label(date(2024, 9, 28)), "2024");
        assert_eq!(fiscal_year_label(date(2024, 12, 31)), "2024");
    }

    #[test]
    fn test_quarter_label_uses_midpoint() {
        assert_eq!(quarter_label(date(2024, 1, 28)), "2023-Q4");
        assert_eq!(quarter_label(date(2024, 6, 30)), "2024-Q2");
        assert_eq!(quarter_label(date(2024, 12, 31)), "2024-Q4");
    }

    #[test]
    fn test_next_quarter_label_wraps_year() {
        assert_eq!(next_quarter_label("2024-Q1"), "2024-Q2");
        assert_eq!(next_quarter_label("2024-Q4"), "2025-Q1");
        assert_eq!(next_quarter_label("2024-Q4E"), "2025-Q1");
    }

    #[test]
    fn test_growth_uses_absolute_base() {
        assert!((growth(Some(150.0), Some(100.0)).unwrap() - 50.0).abs() < 1e-9);
        // Loss shrinking toward zero reads as positive growth.
        assert!((growth(Some(-50.0), Some(-100.0)).unwrap() - 50.0).abs() < 1e-9);
        assert!(growth(Some(150.0), Some(0.0)).is_none());
        assert!(growth(Some(0.0), Some(100.0)).is_none());
        assert!(growth(None, Some(100.0)).is_none());
    }

    #[test]
    fn test_historical_period_derivation() {
        let current = RawPeriod {
            end: date(2024, 1, 28),
            revenue: Some(60.9e9),
            gross_profit: Some(44.3e9),
            ebitda: Some(35.5e9),
            net_income: Some(29.7e9),
            eps: Some(11.93),
            operating_cash_flow: Some(28.0e9),
            capital_expenditure: Some(-1.0e9),
        };
        let previous = RawPeriod {
            end: date(2023, 1, 29),
            revenue: Some(27.0e9),
            eps: Some(1.74),
            operating_cash_flow: Some(5.6e9),
            capital_expenditure: Some(-1.8e9),
            ..Default::default()
        };

        let period = FinancialPeriod::historical(
            fiscal_year_label(current.end),
            &current,
            Some(&previous),
        );

        assert_eq!(period.label, "2023");
        assert!((period.gross_margin.unwrap() - 44.3 / 60.9 * 100.0).abs() < 1e-6);
        assert!((period.net_margin.unwrap() - 29.7 / 60.9 * 100.0).abs() < 1e-6);
        assert!((period.free_cash_flow.unwrap() - 27.0e9).abs() < 1.0);
        assert!((period.revenue_growth.unwrap() - (60.9 - 27.0) / 27.0 * 100.0).abs() < 1e-6);
        assert!(period.fcf_growth.is_some());
        assert!(!period.is_estimate);
    }

    #[test]
    fn test_missing_cash_flow_leaves_fcf_undefined() {
        let raw = RawPeriod {
            end: date(2024, 6, 30),
            operating_cash_flow: Some(5.0e9),
            ..Default::default()
        };
        assert!(raw.free_cash_flow().is_none());
    }

    #[test]
    fn test_estimate_gets_suffix_once() {
        let est = FinancialPeriod::estimate("2025".into(), Some(120.0e9), Some(4.10));
        assert_eq!(est.label, "2025E");
        assert!(est.is_estimate);
        assert!(est.net_income.is_none());

        let est = FinancialPeriod::estimate("2026E".into(), None, Some(5.0));
        assert_eq!(est.label, "2026E");
    }

    #[test]
    fn test_fallback_statements() {
        let record = crate::fallback::lookup("NVDA").unwrap();
        let statements = FinancialStatements::from_fallback(record);
        assert_eq!(statements.annual.len(), 5);
        assert!(statements.quarterly.is_empty());
        assert_eq!(statements.annual[4].label, "2024");
        assert!((statements.annual[4].revenue.unwrap() - 60.9e9).abs() < 1.0);
        assert!(statements.annual[0].revenue_growth.is_none());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(60.9e9), "60.90B");
        assert_eq!(format_amount(-1.25e9), "-1.25B");
        assert_eq!(format_amount(1.29e12), "1.29T");
        assert_eq!(format_amount(522_530_000.0), "522.53M");
        assert_eq!(format_amount(11.93), "11.93");
    }
}
