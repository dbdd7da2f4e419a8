// ============================================================================
// Overview - main screen rendering
// ============================================================================
// Draws the shared frame (header, content, footer) and the overview layout:
// watchlist on the left, ticker card with news and earnings on the right.
// The chart and financials screens plug into the same frame through the
// top-level `render`.
// ============================================================================

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen};
use crate::ui::{chart, financials};

/// Draws the whole interface for the current state.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);

    // While typing, the screen input was opened from stays visible behind
    // the prompt.
    match app.background_screen() {
        Screen::Overview | Screen::InputMode => render_overview(frame, app, chunks[1]),
        Screen::ChartView => chart::render_chart(frame, app, chunks[1]),
        Screen::Financials => financials::render_financials(frame, app, chunks[1]),
    }

    render_footer(frame, app, chunks[2]);
}

/// Header, content, footer.
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" MarketLens ")
        .title_alignment(Alignment::Center);

    let line = if app.is_loading_data() {
        let message = app.loading_message.as_deref().unwrap_or("Loading...");
        Line::from(Span::styled(
            format!("⏳ {}", message),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
    } else if let Some(ticker) = &app.view.ticker {
        Line::from(vec![
            Span::styled(
                ticker.as_str(),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "  ·  {}  ·  {}",
                    app.view.range.label(),
                    app.view.interval.label()
                ),
                Style::default().fg(Color::Gray),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "Press [s] to look up a ticker",
            Style::default().fg(Color::Gray),
        ))
    };

    let paragraph = Paragraph::new(vec![line])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Overview content
// ============================================================================

fn render_overview(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(42), Constraint::Percentage(58)])
        .split(area)
        .to_vec();

    render_watchlist(frame, app, columns[0]);

    let detail = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11),
            Constraint::Min(0),
            Constraint::Length(6),
        ])
        .split(columns[1])
        .to_vec();

    render_quote_card(frame, app, detail[0]);
    render_news(frame, app, detail[1]);
    render_earnings(frame, app, detail[2]);
}

/// Left pane: the (possibly group-filtered) watchlist rows.
fn render_watchlist(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.group_filter {
        Some(group) => format!(" 📊 Watchlist · {} ", group),
        None => " 📊 Watchlist · All ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let entries = app.visible_entries();
    if entries.is_empty() {
        let hint = if app.watchlist.is_empty() {
            "Watchlist empty. [a] adds the current ticker."
        } else {
            "No entries in this group. [g] cycles groups."
        };
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let style = if entry.current_price.is_some() {
                if entry.is_positive() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                }
            } else {
                Style::default().fg(Color::Gray)
            };

            let mut list_item = ListItem::new(format!(" {}", entry.display())).style(style);
            if index == app.selected_index {
                list_item = list_item.style(
                    style
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::REVERSED),
                );
            }
            list_item
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Top-right pane: the resolved ticker card.
fn render_quote_card(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.view.ticker {
        Some(ticker) => format!(" 💼 {} ", ticker),
        None => " 💼 Company ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let profile = match &app.profile {
        Some(profile) => profile,
        None => {
            let hint = match &app.view.ticker {
                Some(ticker) => format!("Loading {}...", ticker),
                None => "No ticker loaded.".to_string(),
            };
            let text = vec![
                Line::from(""),
                Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
            ];
            let paragraph = Paragraph::new(text)
                .block(block)
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, area);
            return;
        }
    };

    let change_color = if profile.is_positive() {
        Color::Green
    } else {
        Color::Red
    };

    let label = Style::default().fg(Color::Gray);
    let text = vec![
        Line::from(Span::styled(
            profile.display_name().to_string(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                profile.price_text(),
                Style::default()
                    .fg(change_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(profile.change_text(), Style::default().fg(change_color)),
        ]),
        Line::from(vec![
            Span::styled("Sector ", label),
            Span::raw(profile.sector_text().to_string()),
            Span::styled("   Mkt Cap ", label),
            Span::raw(profile.market_cap_text().to_string()),
            Span::styled("   P/E ", label),
            Span::raw(profile.pe_text().to_string()),
        ]),
        Line::from(vec![
            Span::styled("Web ", label),
            Span::styled(
                profile.website_text().to_string(),
                Style::default().fg(Color::Blue),
            ),
            Span::styled("   IR ", label),
            Span::styled(
                profile.ir_website_text().to_string(),
                Style::default().fg(Color::Blue),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            profile.description_text(),
            Style::default().fg(Color::Gray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

/// Middle-right pane: latest headlines, two lines per item.
fn render_news(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" 📰 News ");

    if app.news.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "No news available.",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let now = Utc::now();
    let items: Vec<ListItem> = app
        .news
        .iter()
        .map(|item| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    format!(" {}", item.title),
                    Style::default().fg(Color::White),
                )),
                Line::from(Span::styled(
                    format!(
                        "   {} · {}",
                        item.publisher_text(),
                        item.published_text(now)
                    ),
                    Style::default().fg(Color::Gray),
                )),
            ])
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Bottom-right pane: earnings call documents.
fn render_earnings(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" 📅 Earnings Calls ");

    if app.earnings.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "No earnings documents.",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .earnings
        .iter()
        .map(|doc| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!(" • {}", doc.display()),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("  {}", doc.link_text()),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

// ============================================================================
// Footer
// ============================================================================

/// Confirmation prompts beat the input line, which beats the status
/// message, which beats the regular shortcuts.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    if app.is_in_input_mode() {
        render_input_footer(frame, app, area);
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = if app.is_awaiting_delete_confirmation() {
        let ticker = app.selected_ticker().unwrap_or_else(|| "?".to_string());
        Line::from(vec![
            Span::styled(
                "⚠  Press ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[d]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                format!(" again to remove {}, any other key to cancel ⚠", ticker),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    } else if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Press ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " again to quit, any other key to cancel ⚠",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    } else if let Some(status) = &app.status_message {
        Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        shortcut_line(app.background_screen())
    };

    let paragraph = Paragraph::new(vec![line])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn shortcut_line(screen: Screen) -> Line<'static> {
    let key = |text: &'static str, color: Color| {
        Span::styled(
            text,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
    };

    match screen {
        Screen::ChartView => Line::from(vec![
            key("[ESC]", Color::Yellow),
            Span::raw(" Back  "),
            key("[h l]", Color::Yellow),
            Span::raw(" Interval  "),
            key("[[ ]]", Color::Yellow),
            Span::raw(" Range  "),
            key("[m]", Color::Green),
            Span::raw(" Trade  "),
            key("[f]", Color::Yellow),
            Span::raw(" Financials"),
        ]),
        Screen::Financials => Line::from(vec![
            key("[ESC]", Color::Yellow),
            Span::raw(" Back  "),
            key("[p]", Color::Yellow),
            Span::raw(" Annual/Quarterly  "),
            key("[c]", Color::Yellow),
            Span::raw(" Chart"),
        ]),
        _ => Line::from(vec![
            key("[q]", Color::Yellow),
            Span::raw(" Quit  "),
            key("[↑↓ j k]", Color::Yellow),
            Span::raw(" Navigate  "),
            key("[Enter]", Color::Yellow),
            Span::raw(" Load  "),
            key("[s]", Color::Yellow),
            Span::raw(" Search  "),
            key("[a]", Color::Green),
            Span::raw(" Add  "),
            key("[d]", Color::Red),
            Span::raw(" Delete  "),
            key("[g]", Color::Yellow),
            Span::raw(" Group  "),
            key("[r]", Color::Yellow),
            Span::raw(" Refresh  "),
            key("[c]", Color::Yellow),
            Span::raw(" Chart  "),
            key("[f]", Color::Yellow),
            Span::raw(" Financials"),
        ]),
    }
}

/// Prompt, buffer and a blinking block cursor, with the submit hints on
/// the same line.
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let line = Line::from(vec![
        Span::styled(
            app.input_prompt.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.clone(), Style::default().fg(Color::White)),
        Span::styled(
            "█",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::SLOW_BLINK),
        ),
        Span::raw("   "),
        Span::styled(
            "[Enter]",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" Confirm  "),
        Span::styled(
            "[ESC]",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" Cancel"),
    ]);

    let paragraph = Paragraph::new(vec![line])
        .block(block)
        .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}
