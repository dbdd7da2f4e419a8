// ============================================================================
// MarketLens - terminal stock dashboard
// ============================================================================
// Single render loop over shared state, with one background worker thread
// for every network call. The loop never blocks on the network: commands go
// out over a channel, results come back over another, and each redraw shows
// whatever has arrived so far.
// ============================================================================

use std::io;
use std::sync::{mpsc, Arc, Mutex};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use marketlens::api::{self, TickerQuote};
use marketlens::app::{App, InputPurpose, LoadedChart};
use marketlens::config::Config;
use marketlens::fallback::{self, FallbackRecord};
use marketlens::models::markers::parse_marker_entry;
use marketlens::models::watchlist::DEFAULT_GROUP;
use marketlens::models::{
    CandleSeries, EarningsDoc, FinancialStatements, Interval, LiveProfile, NewsItem, QuoteProfile,
    Range, TradeMarker, WatchlistEntry,
};
use marketlens::series;
use marketlens::store::Store;
use marketlens::ui::{render, Event, EventHandler};

// ============================================================================
// AppCommand / AppResult : worker thread protocol
// ============================================================================

/// Commands sent to the worker thread for async execution.
#[derive(Debug, Clone)]
enum AppCommand {
    /// Everything the overview needs for one symbol: profile, news,
    /// earnings, financials and the chart for the current view.
    LoadTicker {
        symbol: String,
        range: Range,
        interval: Interval,
    },

    /// Chart only, after a range or interval change.
    ReloadChart {
        symbol: String,
        range: Range,
        interval: Interval,
    },

    /// Quote lookups for every given ticker, issued concurrently.
    RefreshWatchlist { tickers: Vec<String> },
}

/// Results sent back by the worker thread. Fallback resolution already
/// happened: these carry exactly what the UI should show.
#[derive(Debug)]
enum AppResult {
    TickerLoaded {
        symbol: String,
        profile: QuoteProfile,
        news: Vec<NewsItem>,
        earnings: Vec<EarningsDoc>,
        financials: FinancialStatements,
        chart: Option<LoadedChart>,
    },

    ChartLoaded {
        symbol: String,
        chart: Option<LoadedChart>,
    },

    QuotesRefreshed { quotes: Vec<TickerQuote> },
}

// ============================================================================
// Logging
// ============================================================================

/// File logging with daily rotation under the data directory.
///
/// ```bash
/// tail -f ~/.local/share/marketlens/logs/marketlens.log
/// RUST_LOG=marketlens=trace cargo run
/// ```
fn init_logging(config: &Config) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = config.data_dir().join("logs");
    std::fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "marketlens.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketlens=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialized");
    Ok(())
}

// ============================================================================
// Entry point
// ============================================================================

fn main() -> Result<()> {
    let config = Config::load();

    // If logging fails we still run, just without a log file.
    init_logging(&config).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    println!("MarketLens starting up");
    info!("MarketLens starting up");

    let store = Store::new(config.data_dir());
    let watchlist = store.load_watchlist();
    let trades = store.load_trades();
    let last_ticker = store.load_session();
    info!(entries = watchlist.len(), "Persisted state loaded");

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let app = Arc::new(Mutex::new(App::with_state(watchlist, trades)));

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx, app.clone(), config.clone());

    // Pick up where the last session left off and refresh stored quotes.
    {
        let mut app_lock = app.lock().unwrap();
        if let Some(ticker) = last_ticker {
            info!(ticker = %ticker, "Restoring last viewed ticker");
            request_ticker_load(&mut app_lock, &command_tx, &ticker);
        }
        let tickers: Vec<String> = app_lock
            .watchlist
            .stocks
            .iter()
            .map(|s| s.ticker.clone())
            .collect();
        if !tickers.is_empty() {
            let _ = command_tx.send(AppCommand::RefreshWatchlist { tickers });
        }
    }

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, app.clone(), &events, command_tx, result_rx, &store);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background worker thread
// ============================================================================

/// Worker thread running the async fetches.
///
/// Owns its own tokio runtime; every command is processed with `block_on`,
/// which blocks this thread but never the UI. The loading flag on the
/// shared state is the only thing written directly from here, everything
/// else travels back as an `AppResult`.
fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    app: Arc<Mutex<App>>,
    config: Config,
) {
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
        let client = match api::client::build(config.timeout_secs) {
            Ok(client) => client,
            Err(err) => {
                error!(error = %err, "Failed to build HTTP client, worker exiting");
                return;
            }
        };

        loop {
            match command_rx.recv() {
                Ok(command) => {
                    info!(?command, "Worker received command");

                    match command {
                        AppCommand::LoadTicker {
                            symbol,
                            range,
                            interval,
                        } => {
                            {
                                let mut app_lock = app.lock().unwrap();
                                app_lock.start_loading(Some(format!("Loading {}...", symbol)));
                            }

                            let markers: Vec<TradeMarker> = {
                                let app_lock = app.lock().unwrap();
                                app_lock.trades.for_ticker(&symbol).to_vec()
                            };

                            // One round trip per data slice, all in flight at
                            // once. Each slice fails independently.
                            let fetched = runtime.block_on(async {
                                let (series, profile, news, earnings, financials) = tokio::join!(
                                    api::fetch_daily_series(
                                        &client,
                                        &config.api_base,
                                        &symbol,
                                        range
                                    ),
                                    api::fetch_profile(&client, &config.api_base, &symbol),
                                    api::fetch_news(&client, &config.api_base, &symbol),
                                    api::fetch_earnings_docs(&client, &config.docs_base, &symbol),
                                    api::fetch_financials(&client, &config.api_base, &symbol),
                                );
                                FetchedTicker {
                                    series,
                                    profile,
                                    news,
                                    earnings,
                                    financials,
                                }
                            });

                            let result =
                                resolve_ticker_load(&symbol, range, interval, &markers, fetched);
                            let _ = result_tx.send(result);

                            {
                                let mut app_lock = app.lock().unwrap();
                                app_lock.stop_loading();
                            }
                        }

                        AppCommand::ReloadChart {
                            symbol,
                            range,
                            interval,
                        } => {
                            {
                                let mut app_lock = app.lock().unwrap();
                                app_lock.start_loading(Some(format!(
                                    "Loading {} chart ({}, {})...",
                                    symbol,
                                    range.label(),
                                    interval.label()
                                )));
                            }

                            let markers: Vec<TradeMarker> = {
                                let app_lock = app.lock().unwrap();
                                app_lock.trades.for_ticker(&symbol).to_vec()
                            };

                            let series_res = runtime.block_on(api::fetch_daily_series(
                                &client,
                                &config.api_base,
                                &symbol,
                                range,
                            ));
                            let chart =
                                resolve_chart_load(&symbol, range, interval, &markers, series_res);
                            let _ = result_tx.send(AppResult::ChartLoaded { symbol, chart });

                            {
                                let mut app_lock = app.lock().unwrap();
                                app_lock.stop_loading();
                            }
                        }

                        AppCommand::RefreshWatchlist { tickers } => {
                            {
                                let mut app_lock = app.lock().unwrap();
                                app_lock
                                    .start_loading(Some("Refreshing watchlist...".to_string()));
                            }

                            let quotes = runtime
                                .block_on(refresh_quotes(&client, &config.api_base, tickers));
                            let _ = result_tx.send(AppResult::QuotesRefreshed { quotes });

                            {
                                let mut app_lock = app.lock().unwrap();
                                app_lock.stop_loading();
                            }
                        }
                    }
                }
                Err(_) => {
                    info!("Worker thread exiting (channel closed)");
                    break;
                }
            }
        }
    });
}

/// Looks up every ticker concurrently and collects whatever resolves. A
/// failed lookup falls back to the reference table; tickers with neither
/// are skipped and keep their previous display state.
async fn refresh_quotes(
    client: &reqwest::Client,
    api_base: &str,
    tickers: Vec<String>,
) -> Vec<TickerQuote> {
    let mut set = JoinSet::new();
    for ticker in tickers {
        let client = client.clone();
        let api_base = api_base.to_string();
        set.spawn(async move {
            let result = api::fetch_quote(&client, &api_base, &ticker).await;
            (ticker, result)
        });
    }

    let mut quotes = Vec::new();
    while let Some(joined) = set.join_next().await {
        let Ok((ticker, result)) = joined else {
            continue;
        };
        match result {
            Ok(quote) => quotes.push(quote),
            Err(err) => {
                warn!(ticker = %ticker, error = %err, "Quote lookup failed, trying reference data");
                if let Some(record) = fallback::lookup(&ticker) {
                    quotes.push(TickerQuote {
                        symbol: record.symbol.to_string(),
                        price: record.price,
                        name: Some(record.name.to_string()),
                    });
                }
            }
        }
    }
    quotes
}

// ============================================================================
// Fallback resolution
// ============================================================================
// Each data slice resolves independently: live response, then the built-in
// reference table, then nothing (the UI renders placeholders). A failure
// never takes down the rest of the load.
// ============================================================================

/// Raw outcome of the five concurrent requests behind one ticker load.
struct FetchedTicker {
    series: Result<CandleSeries>,
    profile: Result<LiveProfile>,
    news: Result<Vec<NewsItem>>,
    earnings: Result<Vec<EarningsDoc>>,
    financials: Result<FinancialStatements>,
}

fn resolve_ticker_load(
    symbol: &str,
    range: Range,
    interval: Interval,
    markers: &[TradeMarker],
    fetched: FetchedTicker,
) -> AppResult {
    let record = fallback::lookup(symbol);

    let mut live = match fetched.profile {
        Ok(profile) => Some(profile),
        Err(err) => {
            warn!(ticker = %symbol, error = %err, "Profile request failed");
            None
        }
    };

    let chart = match fetched.series {
        Ok(daily) => {
            // The daily series also supplies the card's price and change.
            let profile = live.get_or_insert_with(LiveProfile::default);
            profile.price = daily.last_close();
            profile.previous_close = daily.previous_close();
            Some(build_chart(&daily, interval, markers, false))
        }
        Err(err) => {
            warn!(ticker = %symbol, error = %err, "History request failed, trying reference data");
            record
                .and_then(|r| fallback::synthetic_series(r, range, Interval::Daily))
                .map(|daily| build_chart(&daily, interval, markers, true))
        }
    };

    let profile = QuoteProfile::resolve(symbol, live.as_ref(), record);

    let news = match fetched.news {
        Ok(items) if !items.is_empty() => items,
        Ok(_) => fallback_news(record),
        Err(err) => {
            warn!(ticker = %symbol, error = %err, "News request failed");
            fallback_news(record)
        }
    };

    let earnings = match fetched.earnings {
        Ok(docs) if !docs.is_empty() => docs,
        Ok(_) => fallback_earnings(record),
        Err(err) => {
            warn!(ticker = %symbol, error = %err, "Earnings listing failed");
            fallback_earnings(record)
        }
    };

    let financials = match fetched.financials {
        Ok(statements) if !statements.is_empty() => statements,
        Ok(_) => fallback_financials(record),
        Err(err) => {
            warn!(ticker = %symbol, error = %err, "Financials request failed");
            fallback_financials(record)
        }
    };

    AppResult::TickerLoaded {
        symbol: symbol.to_string(),
        profile,
        news,
        earnings,
        financials,
        chart,
    }
}

fn resolve_chart_load(
    symbol: &str,
    range: Range,
    interval: Interval,
    markers: &[TradeMarker],
    series_res: Result<CandleSeries>,
) -> Option<LoadedChart> {
    match series_res {
        Ok(daily) => Some(build_chart(&daily, interval, markers, false)),
        Err(err) => {
            warn!(ticker = %symbol, error = %err, "History request failed, trying reference data");
            fallback::lookup(symbol)
                .and_then(|r| fallback::synthetic_series(r, range, Interval::Daily))
                .map(|daily| build_chart(&daily, interval, markers, true))
        }
    }
}

/// Resamples the daily series to the requested interval and assembles the
/// drawable collections. The change is taken from the daily closes before
/// resampling so it always means "vs the previous trading day".
fn build_chart(
    daily: &CandleSeries,
    interval: Interval,
    markers: &[TradeMarker],
    synthetic: bool,
) -> LoadedChart {
    let last_close = daily.last_close();
    let change = daily.change();
    let displayed = series::resample(daily, interval);
    let data = series::assemble(&displayed, markers);
    LoadedChart {
        series: displayed,
        data,
        last_close,
        change,
        synthetic,
    }
}

fn fallback_news(record: Option<&'static FallbackRecord>) -> Vec<NewsItem> {
    record
        .map(|r| {
            r.news
                .iter()
                .map(|(title, publisher, age)| NewsItem::from_fallback(title, publisher, age))
                .collect()
        })
        .unwrap_or_default()
}

fn fallback_earnings(record: Option<&'static FallbackRecord>) -> Vec<EarningsDoc> {
    record
        .map(|r| {
            r.earnings
                .iter()
                .map(|(label, link)| EarningsDoc::from_fallback(label, link))
                .collect()
        })
        .unwrap_or_default()
}

fn fallback_financials(record: Option<&'static FallbackRecord>) -> FinancialStatements {
    record
        .map(FinancialStatements::from_fallback)
        .unwrap_or_default()
}

// ============================================================================
// Event loop
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
    store: &Store,
) -> Result<()> {
    loop {
        {
            let app_lock = app.lock().unwrap();
            if !app_lock.is_running() {
                break;
            }
        }

        // Worker results, non-blocking.
        match result_rx.try_recv() {
            Ok(result) => {
                let mut app_lock = app.lock().unwrap();
                apply_result(&mut app_lock, result, store);
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                error!("Worker thread disconnected!");
            }
        }

        {
            let app_clone = app.clone();
            terminal.draw(|frame| {
                let app_lock = app_clone.lock().unwrap();
                render(frame, &app_lock);
            })?;
        }

        match events.next() {
            Ok(event) => {
                let mut app_lock = app.lock().unwrap();
                handle_event(&mut app_lock, event, &command_tx, store);
            }
            Err(_) => {
                // Input read failed; next iteration will retry.
            }
        }

        {
            let mut app_lock = app.lock().unwrap();
            app_lock.tick();
        }
    }

    Ok(())
}

/// Applies a worker result to the shared state. Results for a symbol the
/// user has already navigated away from are dropped.
fn apply_result(app: &mut App, result: AppResult, store: &Store) {
    match result {
        AppResult::TickerLoaded {
            symbol,
            profile,
            news,
            earnings,
            financials,
            chart,
        } => {
            if app.view.ticker.as_deref() != Some(symbol.as_str()) {
                debug!(ticker = %symbol, "Dropping stale load result");
                return;
            }
            info!(
                ticker = %symbol,
                news = news.len(),
                earnings = earnings.len(),
                has_chart = chart.is_some(),
                "Ticker data loaded"
            );
            app.profile = Some(profile);
            app.news = news;
            app.earnings = earnings;
            app.financials = financials;
            app.chart = chart;
            if let Err(err) = store.save_session(&symbol) {
                error!(error = %err, "Failed to save session");
            }
        }

        AppResult::ChartLoaded { symbol, chart } => {
            if app.view.ticker.as_deref() != Some(symbol.as_str()) {
                debug!(ticker = %symbol, "Dropping stale chart result");
                return;
            }
            if chart.is_none() {
                app.set_status(format!("No chart data for {}", symbol));
            }
            app.chart = chart;
        }

        AppResult::QuotesRefreshed { quotes } => {
            if quotes.is_empty() {
                app.set_status("Quote refresh failed");
                return;
            }
            for quote in quotes {
                if let Some(entry) = app
                    .watchlist
                    .stocks
                    .iter_mut()
                    .find(|s| s.ticker == quote.symbol)
                {
                    entry.apply_quote(quote.price, quote.name.as_deref());
                }
            }
            // Backfilled names should survive a restart.
            persist_watchlist(app, store);
            app.set_status("Watchlist prices refreshed");
        }
    }
}

// ============================================================================
// Event handling
// ============================================================================

fn handle_event(
    app: &mut App,
    event: Event,
    command_tx: &mpsc::Sender<AppCommand>,
    store: &Store,
) {
    use marketlens::ui::events::{
        get_char_from_event, is_add_event, is_backspace_event, is_chart_event, is_delete_event,
        is_down_event, is_enter_event, is_escape_event, is_financials_event, is_group_event,
        is_input_char_event, is_marker_event, is_next_interval_event, is_next_range_event,
        is_previous_interval_event, is_previous_range_event, is_quit_event, is_refresh_event,
        is_scope_toggle_event, is_search_event, is_up_event,
    };

    match event {
        // ========================================
        // Input mode comes first: every typable character must reach the
        // buffer before any shortcut can claim it (tickers contain q, d...).
        // ========================================
        Event::Key(_) if is_escape_event(&event) && app.is_in_input_mode() => {
            info!("User cancelled input");
            app.cancel_input();
        }
        Event::Key(_) if is_enter_event(&event) && app.is_in_input_mode() => {
            handle_submit(app, command_tx, store);
        }
        Event::Key(_) if is_backspace_event(&event) && app.is_in_input_mode() => {
            app.backspace();
        }
        Event::Key(_) if is_input_char_event(&event) && app.is_in_input_mode() => {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }
        Event::Key(_) if app.is_in_input_mode() => {
            // Anything else while typing is dropped.
        }

        // 'q': two-step quit, from any screen.
        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        // 'd': two-step delete of the selected watchlist row.
        Event::Key(_) if is_delete_event(&event) && app.is_on_overview() => {
            if !app.visible_entries().is_empty() {
                if app.is_awaiting_delete_confirmation() {
                    if let Some(ticker) = app.delete_selected() {
                        info!(ticker = %ticker, "User confirmed delete");
                        persist_watchlist(app, store);
                        app.set_status(format!("{} removed from watchlist", ticker));
                    }
                } else {
                    info!("User requested delete (awaiting confirmation)");
                    app.request_delete();
                }
            }
        }

        // 's': look up a ticker.
        Event::Key(_) if is_search_event(&event) && app.is_on_overview() => {
            app.cancel_quit();
            app.cancel_delete();
            app.start_input("Ticker: ", InputPurpose::SearchTicker);
        }

        // 'a': add the current ticker to the watchlist (two chained
        // prompts: buy price, then group).
        Event::Key(_) if is_add_event(&event) && app.is_on_overview() => {
            app.cancel_quit();
            app.cancel_delete();
            match app.view.ticker.clone() {
                Some(ticker) if app.watchlist.contains(&ticker) => {
                    app.set_status(format!("{} is already on the watchlist", ticker));
                }
                Some(ticker) => {
                    info!(ticker = %ticker, "User started add-to-watchlist flow");
                    app.start_input(
                        format!("Buy price for {}: ", ticker),
                        InputPurpose::AddBuyPrice { ticker },
                    );
                }
                None => app.set_status("Load a ticker first ([s] to search)"),
            }
        }

        // Watchlist navigation.
        Event::Key(_) if is_up_event(&event) && app.is_on_overview() => {
            app.cancel_quit();
            app.cancel_delete();
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) && app.is_on_overview() => {
            app.cancel_quit();
            app.cancel_delete();
            app.navigate_down();
        }

        // Enter: load the selected watchlist entry into the overview.
        Event::Key(_) if is_enter_event(&event) && app.is_on_overview() => {
            app.cancel_quit();
            app.cancel_delete();
            if let Some(ticker) = app.selected_ticker() {
                info!(ticker = %ticker, "User loaded watchlist entry");
                request_ticker_load(app, command_tx, &ticker);
            }
        }

        // 'g': cycle the group filter.
        Event::Key(_) if is_group_event(&event) && app.is_on_overview() => {
            app.cancel_quit();
            app.cancel_delete();
            app.cycle_group_filter();
        }

        // 'r': refresh quotes for the whole watchlist.
        Event::Key(_) if is_refresh_event(&event) && app.is_on_overview() => {
            app.cancel_quit();
            app.cancel_delete();
            let tickers: Vec<String> = app
                .watchlist
                .stocks
                .iter()
                .map(|s| s.ticker.clone())
                .collect();
            if tickers.is_empty() {
                app.set_status("Watchlist is empty");
            } else {
                info!(count = tickers.len(), "User requested watchlist refresh");
                let _ = command_tx.send(AppCommand::RefreshWatchlist { tickers });
            }
        }

        // 'c' / 'f': switch to chart or financials for the current ticker.
        Event::Key(_) if is_chart_event(&event) && !app.is_on_chart() => {
            app.cancel_quit();
            app.cancel_delete();
            if app.view.ticker.is_some() {
                app.show_chart();
            } else {
                app.set_status("Load a ticker first ([s] to search)");
            }
        }
        Event::Key(_) if is_financials_event(&event) && !app.is_on_financials() => {
            app.cancel_quit();
            app.cancel_delete();
            if app.view.ticker.is_some() {
                app.show_financials();
            } else {
                app.set_status("Load a ticker first ([s] to search)");
            }
        }

        // ESC: back to the overview.
        Event::Key(_) if is_escape_event(&event) && (app.is_on_chart() || app.is_on_financials()) => {
            app.cancel_quit();
            debug!("User returned to overview");
            app.show_overview();
        }

        // 'h' / 'l': interval; '[' / ']': range. Each change reloads the
        // chart from scratch.
        Event::Key(_) if is_next_interval_event(&event) && app.is_on_chart() => {
            app.cancel_quit();
            app.next_interval();
            info!(interval = %app.view.interval.label(), "User changed interval");
            request_chart_reload(app, command_tx);
        }
        Event::Key(_) if is_previous_interval_event(&event) && app.is_on_chart() => {
            app.cancel_quit();
            app.previous_interval();
            info!(interval = %app.view.interval.label(), "User changed interval");
            request_chart_reload(app, command_tx);
        }
        Event::Key(_) if is_next_range_event(&event) && app.is_on_chart() => {
            app.cancel_quit();
            app.next_range();
            info!(range = %app.view.range.label(), "User changed range");
            request_chart_reload(app, command_tx);
        }
        Event::Key(_) if is_previous_range_event(&event) && app.is_on_chart() => {
            app.cancel_quit();
            app.previous_range();
            info!(range = %app.view.range.label(), "User changed range");
            request_chart_reload(app, command_tx);
        }

        // 'm': record a trade marker for the charted ticker.
        Event::Key(_) if is_marker_event(&event) && app.is_on_chart() => {
            app.cancel_quit();
            app.start_input(
                "Trade (YYYY-MM-DD PRICE buy|sell): ",
                InputPurpose::TradeEntry,
            );
        }

        // 'p': annual <-> quarterly.
        Event::Key(_) if is_scope_toggle_event(&event) && app.is_on_financials() => {
            app.cancel_quit();
            app.toggle_financials_scope();
        }

        Event::Tick => {}

        Event::Key(_) => {
            // Any other key disarms pending confirmations.
            app.cancel_quit();
            app.cancel_delete();
        }

        _ => {}
    }
}

/// Completes whatever the input prompt was for.
fn handle_submit(app: &mut App, command_tx: &mpsc::Sender<AppCommand>, store: &Store) {
    let (value, purpose) = app.submit_input();
    match purpose {
        Some(InputPurpose::SearchTicker) => {
            let symbol = value.trim().to_uppercase();
            if symbol.is_empty() {
                debug!("Empty ticker input, ignoring");
                return;
            }
            info!(ticker = %symbol, "User searched for ticker");
            request_ticker_load(app, command_tx, &symbol);
        }

        Some(InputPurpose::AddBuyPrice { ticker }) => {
            let trimmed = value.trim();
            // Empty means "just watching": no cost basis, no return column.
            let buy_price = if trimmed.is_empty() {
                0.0
            } else {
                match trimmed.parse::<f64>() {
                    Ok(price) if price >= 0.0 => price,
                    _ => {
                        app.set_status(format!("Invalid buy price '{}'", trimmed));
                        return;
                    }
                }
            };
            app.start_input(
                format!("Group for {} (empty for {}): ", ticker, DEFAULT_GROUP),
                InputPurpose::AddGroup { ticker, buy_price },
            );
        }

        Some(InputPurpose::AddGroup { ticker, buy_price }) => {
            let mut entry = WatchlistEntry::new(&ticker, buy_price, value.trim());
            // Reuse the already loaded company name when we have it.
            if let Some(profile) = &app.profile {
                if profile.symbol == entry.ticker {
                    if let Some(name) = &profile.name {
                        entry.name = name.clone();
                    }
                }
            }
            let added = entry.ticker.clone();
            match app.watchlist.add(entry) {
                Ok(()) => {
                    info!(ticker = %added, "Ticker added to watchlist");
                    persist_watchlist(app, store);
                    app.set_status(format!("{} added to watchlist", added));
                    let _ = command_tx.send(AppCommand::RefreshWatchlist {
                        tickers: vec![added],
                    });
                }
                Err(err) => app.set_status(err.to_string()),
            }
        }

        Some(InputPurpose::TradeEntry) => {
            let Some(ticker) = app.view.ticker.clone() else {
                return;
            };
            match parse_marker_entry(&value) {
                Ok(marker) => {
                    info!(
                        ticker = %ticker,
                        date = %marker.date,
                        kind = marker.kind.label(),
                        "Trade marker recorded"
                    );
                    app.trades.add(&ticker, marker);
                    if let Err(err) = store.save_trades(&app.trades) {
                        error!(error = %err, "Failed to save trades");
                    }
                    // Redraw the overlay without refetching the series.
                    let markers = app.trades.for_ticker(&ticker).to_vec();
                    if let Some(loaded) = app.chart.as_mut() {
                        loaded.data = series::assemble(&loaded.series, &markers);
                    }
                    app.set_status(format!("Trade marker added for {}", ticker));
                }
                Err(err) => app.set_status(format!("Invalid trade entry: {}", err)),
            }
        }

        None => {}
    }
}

/// Points the view at a symbol and asks the worker for everything.
fn request_ticker_load(app: &mut App, command_tx: &mpsc::Sender<AppCommand>, symbol: &str) {
    app.set_view_ticker(symbol);
    let symbol = symbol.trim().to_uppercase();
    let _ = command_tx.send(AppCommand::LoadTicker {
        symbol,
        range: app.view.range,
        interval: app.view.interval,
    });
}

fn request_chart_reload(app: &App, command_tx: &mpsc::Sender<AppCommand>) {
    if let Some(symbol) = app.view.ticker.clone() {
        let _ = command_tx.send(AppCommand::ReloadChart {
            symbol,
            range: app.view.range,
            interval: app.view.interval,
        });
    }
}

fn persist_watchlist(app: &App, store: &Store) {
    if let Err(err) = store.save_watchlist(&app.watchlist) {
        error!(error = %err, "Failed to save watchlist");
    }
}

// ============================================================================
// Terminal setup and restoration
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Always called before exit, even on error, so the terminal is never left
/// in raw mode.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;

    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;

    terminal.show_cursor()?;

    Ok(())
}
