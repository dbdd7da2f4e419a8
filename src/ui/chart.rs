// ============================================================================
// Chart - price history rendering
// ============================================================================
// Draws the historical chart for the current ticker: a close-price line,
// one dataset per moving-average overlay, scatter datasets for recorded
// trades, and a volume pane underneath. Every dataset shares the same
// epoch-seconds x axis, so series of different lengths line up by date.
// ============================================================================

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::{App, LoadedChart};
use crate::models::candle::Range;

/// Draws the chart screen into `area`.
pub fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let loaded = match &app.chart {
        Some(loaded) => loaded,
        None => {
            let message = match &app.view.ticker {
                Some(ticker) if app.is_loading_data() => format!("Loading chart for {}...", ticker),
                Some(ticker) => format!("No chart data for {}", ticker),
                None => "No ticker loaded. [s] opens the search prompt.".to_string(),
            };
            render_no_data(frame, area, &message);
            return;
        }
    };

    if loaded.data.is_empty() {
        let message = format!("No chart data for {}", loaded.series.symbol);
        render_no_data(frame, area, &message);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(8),
        ])
        .split(area)
        .to_vec();

    render_chart_header(frame, app, loaded, chunks[0]);
    render_price_chart(frame, loaded, chunks[1]);
    render_volume(frame, loaded, chunks[2]);
}

// ============================================================================
// Header
// ============================================================================

fn render_chart_header(frame: &mut Frame, app: &App, loaded: &LoadedChart, area: Rect) {
    let symbol = loaded.series.symbol.as_str();
    let name = app
        .profile
        .as_ref()
        .filter(|p| p.symbol == symbol)
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| symbol.to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" 📈 {} - {} ", symbol, name));

    let mut spans = Vec::new();
    if let Some(last) = loaded.last_close {
        spans.push(Span::raw("Last "));
        let color = match loaded.change {
            Some((abs, _)) if abs < 0.0 => Color::Red,
            _ => Color::Green,
        };
        spans.push(Span::styled(
            format!("${:.2}", last),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        if let Some((abs, pct)) = loaded.change {
            let arrow = if abs >= 0.0 { "▲" } else { "▼" };
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("{} {:+.2} ({:+.2}%)", arrow, abs, pct),
                Style::default().fg(color),
            ));
        }
    } else {
        spans.push(Span::styled("Last -", Style::default().fg(Color::Gray)));
    }
    if loaded.synthetic {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "[offline data]",
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(vec![Line::from(spans)])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Price chart
// ============================================================================

fn render_price_chart(frame: &mut Frame, loaded: &LoadedChart, area: Rect) {
    let data = &loaded.data;
    let series = &loaded.series;

    // Window direction picks the line color, not the day change.
    let rising = match (data.price.first(), data.price.last()) {
        (Some(first), Some(last)) => last.1 >= first.1,
        _ => true,
    };
    let price_color = if rising { Color::Green } else { Color::Red };

    let mut datasets = vec![Dataset::default()
        .name(series.symbol.as_str())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(price_color))
        .data(&data.price)];

    // One dataset per overlay; shorter series start later on the shared
    // axis instead of being stretched to match.
    for (points, label, color) in [
        (&data.ma10, "MA10", Color::Yellow),
        (&data.ma20, "MA20", Color::Blue),
        (&data.ma50, "MA50", Color::Magenta),
    ] {
        if !points.is_empty() {
            datasets.push(
                Dataset::default()
                    .name(label)
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(color))
                    .data(points),
            );
        }
    }

    if !data.buys.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Buy")
                .marker(symbols::Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
                .data(&data.buys),
        );
    }
    if !data.sells.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Sell")
                .marker(symbols::Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .data(&data.sells),
        );
    }

    let (x_min, x_max) = data.x_bounds();
    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([x_min, x_max])
        .labels(vec![
            Span::raw(x_label(x_min, series.range)),
            Span::raw(x_label((x_min + x_max) / 2.0, series.range)),
            Span::raw(x_label(x_max, series.range)),
        ]);

    let (y_min, y_max) = data.y_bounds();
    let y_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("${:.0}", y_min)),
            Span::raw(format!("${:.0}", (y_min + y_max) / 2.0)),
            Span::raw(format!("${:.0}", y_max)),
        ]);

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(format!(
                    " {} · {} · {} ",
                    series.symbol,
                    series.range.label(),
                    series.interval.label()
                )),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

/// Axis label precision follows the window width.
fn x_label(ts: f64, range: Range) -> String {
    let Some(date) = DateTime::<Utc>::from_timestamp(ts as i64, 0) else {
        return String::new();
    };
    let format = match range {
        Range::OneMonth | Range::ThreeMonths => "%b %d",
        Range::SixMonths | Range::OneYear => "%b %Y",
        Range::FiveYears | Range::Max => "%Y",
    };
    date.format(format).to_string()
}

// ============================================================================
// Volume
// ============================================================================

fn render_volume(frame: &mut Frame, loaded: &LoadedChart, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(" Volume ");

    if loaded.data.max_volume() == 0 {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Volume unavailable",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    // One cell per bucket; older buckets fall off the left edge when the
    // window is wider than the pane.
    let capacity = area.width.saturating_sub(2) as usize;
    let volume = &loaded.data.volume;
    let visible = &volume[volume.len().saturating_sub(capacity)..];

    let bars: Vec<Bar> = visible
        .iter()
        .map(|bucket| {
            let color = if bucket.advancing {
                Color::Green
            } else {
                Color::Red
            };
            Bar::default()
                .value(bucket.volume)
                .style(Style::default().fg(color))
                .text_value(String::new())
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

// ============================================================================
// Helper: shown when there is nothing to draw
// ============================================================================

fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" ⚠ Chart ");

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(
            "[ESC] Back",
            Style::default().fg(Color::Gray),
        )),
    ];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candle::day_ts;

    #[test]
    fn test_x_label_follows_range_width() {
        let ts = day_ts(2024, 3, 1).timestamp() as f64;
        assert_eq!(x_label(ts, Range::OneMonth), "Mar 01");
        assert_eq!(x_label(ts, Range::OneYear), "Mar 2024");
        assert_eq!(x_label(ts, Range::Max), "2024");
    }
}
