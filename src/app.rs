// ============================================================================
// Structure : App
// ============================================================================
// Central application state. Every UI component reads from App and every
// mutation goes through it, so the render loop always sees one coherent
// snapshot.
// ============================================================================

use crate::models::candle::{CandleSeries, Interval, Range};
use crate::models::earnings::EarningsDoc;
use crate::models::financials::FinancialStatements;
use crate::models::markers::TradeLog;
use crate::models::news::NewsItem;
use crate::models::profile::QuoteProfile;
use crate::models::watchlist::{Watchlist, WatchlistEntry};
use crate::series::ChartData;

/// Ticks a status line stays visible (10s at the 250ms tick rate).
const STATUS_TICKS: u16 = 40;

/// Screens of the application, one active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Watchlist plus the ticker card, news and earnings for the current
    /// symbol.
    Overview,

    /// Price chart with overlays for the current symbol.
    ChartView,

    /// Financial statement tables for the current symbol.
    Financials,

    /// Modal text entry. Enter submits, ESC cancels.
    InputMode,
}

/// What the text being typed is for. Adding to the watchlist chains two
/// prompts, so the earlier answers ride along.
#[derive(Debug, Clone, PartialEq)]
pub enum InputPurpose {
    /// Ticker to load on the overview.
    SearchTicker,
    /// Buy price for a ticker being added to the watchlist.
    AddBuyPrice { ticker: String },
    /// Group for a ticker being added; empty means the default group.
    AddGroup { ticker: String, buy_price: f64 },
    /// One-line trade marker: `YYYY-MM-DD PRICE buy|sell`.
    TradeEntry,
}

/// What the user is looking at: symbol, range and interval. One explicit
/// struct that redraws and background loads both read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub ticker: Option<String>,
    pub range: Range,
    pub interval: Interval,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            ticker: None,
            range: Range::default(),
            interval: Interval::default(),
        }
    }
}

/// A fully prepared chart: the displayed (resampled) series, its drawable
/// collections, and the day change taken from the daily series before
/// resampling.
#[derive(Debug, Clone)]
pub struct LoadedChart {
    pub series: CandleSeries,
    pub data: ChartData,
    pub last_close: Option<f64>,
    pub change: Option<(f64, f64)>,
    /// True when the series was synthesized from the fallback table.
    pub synthetic: bool,
}

pub struct App {
    pub running: bool,

    /// Persisted watchlist, including group names.
    pub watchlist: Watchlist,

    /// Recorded trades, keyed by ticker.
    pub trades: TradeLog,

    /// Selection within the *visible* (group-filtered) watchlist rows.
    pub selected_index: usize,

    /// Active group filter; `None` shows every group.
    pub group_filter: Option<String>,

    pub current_screen: Screen,
    pub view: ViewState,

    // Loaded data for the current ticker. All optional or empty until a
    // background load completes.
    pub profile: Option<QuoteProfile>,
    pub news: Vec<NewsItem>,
    pub earnings: Vec<EarningsDoc>,
    pub financials: FinancialStatements,
    pub chart: Option<LoadedChart>,

    /// Financials screen shows quarterly columns instead of annual.
    pub financials_quarterly: bool,

    // Two-step confirmations: first key arms, second key acts, anything
    // else disarms.
    pub confirm_quit: bool,
    pub confirm_delete: bool,

    pub is_loading: bool,
    pub loading_message: Option<String>,

    /// Transient footer message, cleared by the tick countdown.
    pub status_message: Option<String>,
    status_ticks: u16,

    // Modal input state.
    pub input_buffer: String,
    pub input_prompt: String,
    pub input_purpose: Option<InputPurpose>,
    input_return: Screen,
}

impl App {
    pub fn new() -> Self {
        Self {
            running: true,
            watchlist: Watchlist::default(),
            trades: TradeLog::default(),
            selected_index: 0,
            group_filter: None,
            current_screen: Screen::Overview,
            view: ViewState::default(),
            profile: None,
            news: Vec::new(),
            earnings: Vec::new(),
            financials: FinancialStatements::default(),
            chart: None,
            financials_quarterly: false,
            confirm_quit: false,
            confirm_delete: false,
            is_loading: false,
            loading_message: None,
            status_message: None,
            status_ticks: 0,
            input_buffer: String::new(),
            input_prompt: String::new(),
            input_purpose: None,
            input_return: Screen::Overview,
        }
    }

    /// Creates an App around previously persisted state.
    pub fn with_state(watchlist: Watchlist, trades: TradeLog) -> Self {
        Self {
            watchlist,
            trades,
            ..Self::new()
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Called every loop iteration; ages the status line.
    pub fn tick(&mut self) {
        if self.status_ticks > 0 {
            self.status_ticks -= 1;
            if self.status_ticks == 0 {
                self.status_message = None;
            }
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_ticks = STATUS_TICKS;
    }

    // ========================================================================
    // Watchlist navigation and grouping
    // ========================================================================

    /// Rows currently shown, after the group filter.
    pub fn visible_entries(&self) -> Vec<&WatchlistEntry> {
        self.watchlist.visible(self.group_filter.as_deref())
    }

    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.visible_entries().len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    pub fn selected_entry(&self) -> Option<&WatchlistEntry> {
        self.visible_entries().get(self.selected_index).copied()
    }

    pub fn selected_ticker(&self) -> Option<String> {
        self.selected_entry().map(|e| e.ticker.clone())
    }

    /// Advances the group filter: all groups, then each group in order,
    /// then back to all. Selection resets because the rows change.
    pub fn cycle_group_filter(&mut self) {
        let groups = &self.watchlist.groups;
        self.group_filter = match &self.group_filter {
            None => groups.first().cloned(),
            Some(current) => {
                let position = groups.iter().position(|g| g == current);
                position.and_then(|i| groups.get(i + 1)).cloned()
            }
        };
        self.selected_index = 0;
    }

    /// Removes the selected row from the watchlist and keeps the selection
    /// in bounds. Returns the removed ticker so the caller can persist and
    /// report.
    pub fn delete_selected(&mut self) -> Option<String> {
        self.confirm_delete = false;
        let ticker = self.selected_ticker()?;
        self.watchlist.remove(&ticker);

        let len = self.visible_entries().len();
        if self.selected_index >= len && self.selected_index > 0 {
            self.selected_index -= 1;
        }
        Some(ticker)
    }

    // ========================================================================
    // Screen transitions
    // ========================================================================

    pub fn show_overview(&mut self) {
        self.current_screen = Screen::Overview;
    }

    pub fn show_chart(&mut self) {
        self.current_screen = Screen::ChartView;
    }

    pub fn show_financials(&mut self) {
        self.current_screen = Screen::Financials;
    }

    pub fn is_on_overview(&self) -> bool {
        self.current_screen == Screen::Overview
    }

    pub fn is_on_chart(&self) -> bool {
        self.current_screen == Screen::ChartView
    }

    pub fn is_on_financials(&self) -> bool {
        self.current_screen == Screen::Financials
    }

    /// Sets the displayed ticker. Loaded data from the previous ticker is
    /// dropped immediately so stale panes never show under a new symbol.
    pub fn set_view_ticker(&mut self, ticker: &str) {
        let ticker = ticker.trim().to_uppercase();
        if self.view.ticker.as_deref() == Some(ticker.as_str()) {
            return;
        }
        self.view.ticker = Some(ticker);
        self.profile = None;
        self.news.clear();
        self.earnings.clear();
        self.financials = FinancialStatements::default();
        self.chart = None;
    }

    pub fn next_range(&mut self) {
        self.view.range = self.view.range.next();
    }

    pub fn previous_range(&mut self) {
        self.view.range = self.view.range.previous();
    }

    pub fn next_interval(&mut self) {
        self.view.interval = self.view.interval.next();
    }

    pub fn previous_interval(&mut self) {
        self.view.interval = self.view.interval.previous();
    }

    pub fn toggle_financials_scope(&mut self) {
        self.financials_quarterly = !self.financials_quarterly;
    }

    // ========================================================================
    // Two-step confirmations
    // ========================================================================

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    pub fn request_delete(&mut self) {
        self.confirm_delete = true;
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_delete = false;
    }

    pub fn is_awaiting_delete_confirmation(&self) -> bool {
        self.confirm_delete
    }

    // ========================================================================
    // Loading state
    // ========================================================================

    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }

    // ========================================================================
    // Input mode
    // ========================================================================

    /// Enters modal input. The current screen is restored on submit or
    /// cancel.
    pub fn start_input(&mut self, prompt: impl Into<String>, purpose: InputPurpose) {
        if self.current_screen != Screen::InputMode {
            self.input_return = self.current_screen;
        }
        self.current_screen = Screen::InputMode;
        self.input_buffer.clear();
        self.input_prompt = prompt.into();
        self.input_purpose = Some(purpose);
    }

    pub fn cancel_input(&mut self) {
        self.current_screen = self.input_return;
        self.input_buffer.clear();
        self.input_prompt.clear();
        self.input_purpose = None;
    }

    /// Takes the typed value and its purpose, leaving input mode.
    pub fn submit_input(&mut self) -> (String, Option<InputPurpose>) {
        let value = self.input_buffer.clone();
        let purpose = self.input_purpose.take();
        self.current_screen = self.input_return;
        self.input_buffer.clear();
        self.input_prompt.clear();
        (value, purpose)
    }

    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }

    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen == Screen::InputMode
    }

    /// Screen drawn behind the input footer while typing.
    pub fn background_screen(&self) -> Screen {
        if self.current_screen == Screen::InputMode {
            self.input_return
        } else {
            self.current_screen
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_entries() -> App {
        let mut watchlist = Watchlist::default();
        watchlist
            .add(WatchlistEntry::new("NVDA", 450.0, "Tech"))
            .unwrap();
        watchlist
            .add(WatchlistEntry::new("AAPL", 180.0, "Tech"))
            .unwrap();
        watchlist
            .add(WatchlistEntry::new("KO", 60.0, "Dividend"))
            .unwrap();
        App::with_state(watchlist, TradeLog::default())
    }

    #[test]
    fn test_app_creation() {
        let app = App::new();
        assert!(app.is_running());
        assert!(app.watchlist.is_empty());
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.current_screen, Screen::Overview);
        assert!(app.view.ticker.is_none());
        assert_eq!(app.view.range, Range::OneYear);
        assert_eq!(app.view.interval, Interval::Daily);
    }

    #[test]
    fn test_app_quit() {
        let mut app = App::new();
        app.quit();
        assert!(!app.is_running());
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut app = app_with_entries();

        assert_eq!(app.selected_index, 0);
        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_index, 2);
        app.navigate_down();
        assert_eq!(app.selected_index, 2);

        app.navigate_up();
        app.navigate_up();
        app.navigate_up();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_group_filter_cycles_and_scopes_navigation() {
        let mut app = app_with_entries();
        assert_eq!(app.visible_entries().len(), 3);

        // Default -> Tech -> Dividend -> all.
        app.cycle_group_filter();
        assert_eq!(app.group_filter.as_deref(), Some("Default"));
        assert!(app.visible_entries().is_empty());

        app.cycle_group_filter();
        assert_eq!(app.group_filter.as_deref(), Some("Tech"));
        assert_eq!(app.visible_entries().len(), 2);

        // Navigation is bounded by the filtered rows.
        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_index, 1);

        app.cycle_group_filter();
        assert_eq!(app.group_filter.as_deref(), Some("Dividend"));
        assert_eq!(app.selected_index, 0);

        app.cycle_group_filter();
        assert!(app.group_filter.is_none());
    }

    #[test]
    fn test_selected_entry_respects_filter() {
        let mut app = app_with_entries();
        app.cycle_group_filter(); // Default (empty)
        app.cycle_group_filter(); // Tech
        app.navigate_down();
        assert_eq!(app.selected_ticker().as_deref(), Some("AAPL"));
    }

    #[test]
    fn test_delete_selected_adjusts_selection() {
        let mut app = app_with_entries();
        app.selected_index = 2;
        app.request_delete();

        let removed = app.delete_selected();
        assert_eq!(removed.as_deref(), Some("KO"));
        assert!(!app.is_awaiting_delete_confirmation());
        assert_eq!(app.selected_index, 1);
        assert_eq!(app.watchlist.len(), 2);

        // Deleting from an empty view is a no-op.
        let mut empty = App::new();
        assert!(empty.delete_selected().is_none());
    }

    #[test]
    fn test_set_view_ticker_clears_stale_data() {
        let mut app = App::new();
        app.set_view_ticker("nvda");
        assert_eq!(app.view.ticker.as_deref(), Some("NVDA"));

        app.news.push(NewsItem::from_fallback("old", "x", "1h ago"));
        app.set_view_ticker("AAPL");
        assert!(app.news.is_empty());

        // Same ticker keeps loaded data.
        app.news.push(NewsItem::from_fallback("new", "x", "1h ago"));
        app.set_view_ticker("AAPL");
        assert_eq!(app.news.len(), 1);
    }

    #[test]
    fn test_range_and_interval_cycles() {
        let mut app = App::new();
        app.next_range();
        assert_eq!(app.view.range, Range::FiveYears);
        app.previous_range();
        app.previous_range();
        assert_eq!(app.view.range, Range::SixMonths);

        app.next_interval();
        assert_eq!(app.view.interval, Interval::Weekly);
        app.next_interval();
        app.next_interval();
        assert_eq!(app.view.interval, Interval::Daily);
    }

    #[test]
    fn test_input_mode_round_trip() {
        let mut app = App::new();
        app.show_chart();
        app.start_input("trade> ", InputPurpose::TradeEntry);
        assert!(app.is_in_input_mode());

        app.append_char('x');
        app.backspace();
        for c in "2024-03-01 450 buy".chars() {
            app.append_char(c);
        }
        let (value, purpose) = app.submit_input();
        assert_eq!(value, "2024-03-01 450 buy");
        assert_eq!(purpose, Some(InputPurpose::TradeEntry));
        // Back to the screen input started from.
        assert!(app.is_on_chart());
        assert!(app.input_buffer.is_empty());
    }

    #[test]
    fn test_input_cancel_restores_screen() {
        let mut app = App::new();
        app.start_input("ticker> ", InputPurpose::SearchTicker);
        app.append_char('N');
        app.cancel_input();
        assert!(app.is_on_overview());
        assert!(app.input_purpose.is_none());
    }

    #[test]
    fn test_two_step_quit() {
        let mut app = App::new();
        app.request_quit();
        assert!(app.is_awaiting_quit_confirmation());
        app.cancel_quit();
        assert!(!app.is_awaiting_quit_confirmation());
        assert!(!app.confirm_quit);
        assert!(app.is_running());
    }

    #[test]
    fn test_status_message_expires() {
        let mut app = App::new();
        app.set_status("saved");
        assert!(app.status_message.is_some());
        for _ in 0..STATUS_TICKS {
            app.tick();
        }
        assert!(app.status_message.is_none());
    }
}
