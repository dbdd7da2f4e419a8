// ============================================================================
// Financials - statement table rendering
// ============================================================================
// One column per fiscal period, one row per metric. Estimate columns carry
// an E suffix in their label and are dimmed.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::models::financials::{format_amount, FinancialPeriod};

/// Draws the financials screen into `area`.
pub fn render_financials(frame: &mut Frame, app: &App, area: Rect) {
    let ticker = match &app.view.ticker {
        Some(ticker) => ticker.as_str(),
        None => {
            render_no_data(frame, area, "No ticker loaded. [s] opens the search prompt.");
            return;
        }
    };

    let scope = if app.financials_quarterly {
        "Quarterly"
    } else {
        "Annual"
    };
    let periods = if app.financials_quarterly {
        &app.financials.quarterly
    } else {
        &app.financials.annual
    };

    if periods.is_empty() {
        let message = if app.is_loading_data() {
            format!("Loading financials for {}...", ticker)
        } else {
            format!("No {} data for {}", scope.to_lowercase(), ticker)
        };
        render_no_data(frame, area, &message);
        return;
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" 💰 Financials · {} · {} ", ticker, scope));

    let mut header_cells = vec![Cell::from("")];
    header_cells.extend(periods.iter().map(|p| {
        let style = if p.is_estimate {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        };
        Cell::from(Span::styled(p.label.clone(), style))
    }));
    let header = Row::new(header_cells).bottom_margin(1);

    let dim_if_estimate = |p: &FinancialPeriod, style: Style| {
        if p.is_estimate {
            style.add_modifier(Modifier::DIM)
        } else {
            style
        }
    };

    let amount_cell = |p: &FinancialPeriod, value: Option<f64>| {
        let text = value.map(format_amount).unwrap_or_else(|| "-".to_string());
        Cell::from(Span::styled(
            text,
            dim_if_estimate(p, Style::default().fg(Color::White)),
        ))
    };
    let growth_cell = |p: &FinancialPeriod, value: Option<f64>| match value {
        Some(pct) => {
            let color = if pct >= 0.0 { Color::Green } else { Color::Red };
            Cell::from(Span::styled(
                format!("{:+.1}%", pct),
                dim_if_estimate(p, Style::default().fg(color)),
            ))
        }
        None => Cell::from("-"),
    };
    let margin_cell = |p: &FinancialPeriod, value: Option<f64>| {
        let text = value
            .map(|pct| format!("{:.1}%", pct))
            .unwrap_or_else(|| "-".to_string());
        Cell::from(Span::styled(
            text,
            dim_if_estimate(p, Style::default().fg(Color::White)),
        ))
    };
    let eps_cell = |p: &FinancialPeriod, value: Option<f64>| {
        let text = value
            .map(|eps| format!("{:.2}", eps))
            .unwrap_or_else(|| "-".to_string());
        Cell::from(Span::styled(
            text,
            dim_if_estimate(p, Style::default().fg(Color::White)),
        ))
    };

    let metric_row = |label: &str, cell: &dyn Fn(&FinancialPeriod) -> Cell<'static>| {
        let mut cells = vec![Cell::from(Span::styled(
            label.to_string(),
            Style::default().fg(Color::Gray),
        ))];
        cells.extend(periods.iter().map(cell));
        Row::new(cells)
    };

    let rows = vec![
        metric_row("Revenue", &|p| amount_cell(p, p.revenue)),
        metric_row("Rev Growth", &|p| growth_cell(p, p.revenue_growth)),
        metric_row("Gross Mgn", &|p| margin_cell(p, p.gross_margin)),
        metric_row("EBITDA Mgn", &|p| margin_cell(p, p.ebitda_margin)),
        metric_row("Net Income", &|p| amount_cell(p, p.net_income)),
        metric_row("Net Mgn", &|p| margin_cell(p, p.net_margin)),
        metric_row("EPS", &|p| eps_cell(p, p.eps)),
        metric_row("EPS Growth", &|p| growth_cell(p, p.eps_growth)),
        metric_row("FCF", &|p| amount_cell(p, p.free_cash_flow)),
        metric_row("FCF Growth", &|p| growth_cell(p, p.fcf_growth)),
    ];

    let mut widths = vec![Constraint::Length(11)];
    widths.extend(periods.iter().map(|_| Constraint::Length(9)));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn render_no_data(frame: &mut Frame, area: Rect, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" ⚠ Financials ");

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
