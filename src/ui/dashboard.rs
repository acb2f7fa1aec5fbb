//! Dashboard screen rendering
//!
//! Header with the portfolio total, top-asset cards with sparklines, the
//! historical chart, the paginated market table and a key-hint footer.

use chrono::{DateTime, Local};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use super::widgets::PriceSparkline;
use crate::app::{App, InputMode, ToastKind};
use crate::data::coingecko::{MAIN_CHART_ASSET, PAGE_SIZE};
use crate::data::format::{format_change_pill, format_change_tag, format_money};
use crate::data::MarketCoin;
use crate::portfolio::PriceSource;

/// Placeholder shown in table cells while a page is loading
const SKELETON: &str = "░░░░░░░░";

/// Color for a 24h change
fn change_color(change: f64) -> Color {
    if change >= 0.0 {
        Color::Green
    } else {
        Color::Red
    }
}

/// Axis label for a chart timestamp: `HH:00` for intraday ranges, the date otherwise
pub fn chart_label(timestamp_ms: f64, days: u32) -> String {
    let Some(utc) = DateTime::from_timestamp_millis(timestamp_ms as i64) else {
        return String::new();
    };
    let local = utc.with_timezone(&Local);
    if days <= 1 {
        local.format("%H:00").to_string()
    } else {
        local.format("%Y-%m-%d").to_string()
    }
}

/// Renders the full dashboard
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                   // Header
            Constraint::Length(6),                   // Cards
            Constraint::Min(8),                      // Chart
            Constraint::Length(PAGE_SIZE as u16 + 4), // Table
            Constraint::Length(1),                   // Footer
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_cards(frame, app, chunks[1]);
    render_chart(frame, app, chunks[2]);
    render_table(frame, app, chunks[3]);
    render_footer(frame, app, chunks[4]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let total = match app.valuation {
        Some(valuation) if valuation.currency == app.currency => {
            let note = match valuation.source {
                PriceSource::ListingCache => " (cached)",
                PriceSource::Snapshot => " (offline)",
                PriceSource::Live | PriceSource::Empty => "",
            };
            format!("{}{}", format_money(valuation.total, app.currency), note)
        }
        _ => "--".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(
            "CryptoVisual",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.currency.code().to_uppercase(),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
        Span::raw("Portfolio: "),
        Span::styled(
            total,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  ({} assets)", app.portfolio.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    if app.top_assets.is_empty() {
        let block = Block::default().borders(Borders::ALL);
        let text = Paragraph::new("Loading top assets...")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(text, area);
        return;
    }

    let count = app.top_assets.len() as u32;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints((0..count).map(|_| Constraint::Ratio(1, count)))
        .split(area);

    for (coin, column) in app.top_assets.iter().zip(columns.iter()) {
        render_card(frame, app, coin, *column);
    }
}

fn render_card(frame: &mut Frame, app: &App, coin: &MarketCoin, area: Rect) {
    let change = coin.change_24h();
    let block = Block::default()
        .title(format!(" {} ({}) ", coin.name, coin.symbol.to_uppercase()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(Span::styled(
            format_money(coin.current_price, app.currency),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        rows[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            format_change_tag(change),
            Style::default().fg(change_color(change)),
        )),
        rows[1],
    );
    frame.render_widget(
        PriceSparkline::new(coin.sparkline()).style(Style::default().fg(change_color(change))),
        rows[2],
    );
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        " {}/{} · {} ",
        MAIN_CHART_ASSET.to_uppercase(),
        app.currency.code().to_uppercase(),
        app.timeframe.label()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let (Some((low, high)), Some(&(first_ts, _)), Some(&(last_ts, _))) = (
        app.chart.bounds(),
        app.chart.prices.first(),
        app.chart.prices.last(),
    ) else {
        let text = Paragraph::new("Chart data unavailable")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(text, area);
        return;
    };

    let days = app.timeframe.days();
    let mid_ts = first_ts + (last_ts - first_ts) / 2.0;
    let x_labels = vec![
        Span::raw(chart_label(first_ts, days)),
        Span::raw(chart_label(mid_ts, days)),
        Span::raw(chart_label(last_ts, days)),
    ];
    let y_labels = vec![
        Span::raw(format_money(low, app.currency)),
        Span::raw(format_money(high, app.currency)),
    ];
    let padding = ((high - low) * 0.05).max(f64::EPSILON);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Yellow))
        .data(&app.chart.prices);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([first_ts, last_ts.max(first_ts + 1.0)])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([low - padding, high + padding])
                .labels(y_labels),
        );

    frame.render_widget(chart, area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let mut title = format!(" Market · Page {} ", app.page);
    if app.mode == InputMode::Search {
        title.push_str(&format!("· Search: {}_ ", app.search));
    } else if !app.search.is_empty() {
        title.push_str(&format!("· Filter: {} ", app.search));
    }
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let header = Row::new(vec!["#", "Name", "Price", "24h", "Market Cap"]).style(
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = if app.market_loading && app.market_rows.is_empty() {
        (0..PAGE_SIZE)
            .map(|_| {
                Row::new(vec![SKELETON; 5]).style(Style::default().fg(Color::DarkGray))
            })
            .collect()
    } else {
        let filtered = app.filtered_rows();
        if filtered.is_empty() {
            vec![Row::new(vec![Cell::from(""), Cell::from("No matches")])
                .style(Style::default().fg(Color::DarkGray))]
        } else {
            filtered
                .into_iter()
                .map(|coin| market_row(app, coin))
                .collect()
        }
    };

    let widths = [
        Constraint::Length(11),
        Constraint::Min(18),
        Constraint::Length(18),
        Constraint::Length(10),
        Constraint::Length(22),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn market_row<'a>(app: &App, coin: &'a MarketCoin) -> Row<'a> {
    let position = app
        .market_rows
        .iter()
        .position(|c| c.id == coin.id)
        .unwrap_or(0);
    let rank =
        u64::from(app.page.saturating_sub(1)) * u64::from(PAGE_SIZE) + position as u64 + 1;
    let change = coin.change_24h();
    let market_cap = coin
        .market_cap
        .map(|cap| format_money(cap, app.currency))
        .unwrap_or_else(|| "-".to_string());

    Row::new(vec![
        Cell::from(rank.to_string()),
        Cell::from(format!("{} {}", coin.name, coin.symbol.to_uppercase())),
        Cell::from(format_money(coin.current_price, app.currency)),
        Cell::from(Span::styled(
            format_change_pill(change),
            Style::default().fg(change_color(change)),
        )),
        Cell::from(market_cap),
    ])
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let prev_style = if app.can_go_back() {
        key
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![
        Span::styled("c", key),
        Span::raw(" Currency  "),
        Span::styled("h/d/w", key),
        Span::raw(" Range  "),
        Span::styled("←", prev_style),
        Span::raw("/"),
        Span::styled("→", key),
        Span::raw(" Page  "),
        Span::styled("/", key),
        Span::raw(" Search  "),
        Span::styled("a", key),
        Span::raw(" Add  "),
        Span::styled("?", key),
        Span::raw(" Help  "),
        Span::styled("q", key),
        Span::raw(" Quit"),
    ];

    // Add data freshness indicator
    if let Some(last_refresh) = app.last_refresh {
        let mins_ago = (Local::now() - last_refresh).num_minutes();
        let freshness_text = if mins_ago < 1 {
            " │ Data: just now".to_string()
        } else {
            format!(" │ Data: {}m ago", mins_ago)
        };
        spans.push(Span::styled(
            freshness_text,
            Style::default().fg(Color::DarkGray),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}

/// Renders active toasts stacked in the top-right corner
pub fn render_toasts(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let mut y = area.y + 1;

    for toast in &app.toasts {
        let width = (toast.message.chars().count() as u16 + 4).min(area.width);
        if y + 3 > area.bottom() {
            break;
        }
        let rect = Rect::new(area.right().saturating_sub(width + 1), y, width, 3);
        let color = match toast.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Warning => Color::Yellow,
        };
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(toast.message.as_str())
                .style(Style::default().fg(color))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color)),
                ),
            rect,
        );
        y += 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::cache::{MemoryStore, Reply, Resolver, ScriptedTransport};
    use crate::data::{fallback_coins, fallback_top_assets, Currency, MarketChart, MarketClient};
    use crate::portfolio::Valuation;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    /// Helper to create a test app showing the dashboard
    fn create_test_app() -> App {
        let resolver = Resolver::new(
            Arc::new(MemoryStore::new()),
            ScriptedTransport::new(Reply::Unreachable),
        );
        let mut app = App::new(MarketClient::with_base_url(resolver, "https://example.test"));
        app.state = AppState::Dashboard;
        app.top_assets = fallback_top_assets(Currency::Usd);
        app.market_rows = fallback_coins();
        app
    }

    fn rendered(app: &App) -> String {
        let backend = TestBackend::new(120, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                render(frame, app);
                render_toasts(frame, app);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_render_produces_non_empty_buffer() {
        let content = rendered(&create_test_app());
        assert!(content.contains("CryptoVisual"));
    }

    #[test]
    fn test_cards_show_price_and_change_tag() {
        let content = rendered(&create_test_app());
        assert!(content.contains("Bitcoin (BTC)"));
        assert!(content.contains("$95,420"));
        assert!(content.contains("+1.25%"));
        assert!(content.contains("-0.45%"));
    }

    #[test]
    fn test_table_rows_and_page_indicator() {
        let content = rendered(&create_test_app());
        assert!(content.contains("Market · Page 1"));
        assert!(content.contains("Dogecoin DOGE"));
        assert!(content.contains("▼ 3.20%"));
    }

    #[test]
    fn test_table_renders_on_very_large_page() {
        let mut app = create_test_app();
        app.page = 500_000_000;

        let content = rendered(&app);

        assert!(content.contains("Market · Page 500000000"));
        assert!(content.contains("Dogecoin DOGE"));

        app.page = u32::MAX;
        let content = rendered(&app);
        assert!(content.contains(&format!("Page {}", u32::MAX)));
    }

    #[test]
    fn test_skeleton_rows_while_loading() {
        let mut app = create_test_app();
        app.market_rows.clear();
        app.market_loading = true;

        let content = rendered(&app);

        assert!(content.contains(SKELETON));
        assert!(!content.contains("Dogecoin"));
    }

    #[test]
    fn test_search_without_matches() {
        let mut app = create_test_app();
        app.search = "zzz".to_string();

        let content = rendered(&app);

        assert!(content.contains("No matches"));
        assert!(content.contains("Filter: zzz"));
    }

    #[test]
    fn test_header_shows_portfolio_total_and_source() {
        let mut app = create_test_app();
        app.valuation = Some(Valuation {
            total: 100_000.0,
            currency: Currency::Usd,
            source: PriceSource::ListingCache,
        });

        let content = rendered(&app);

        assert!(content.contains("Portfolio: $100,000 (cached)"));
    }

    #[test]
    fn test_header_ignores_valuation_in_other_currency() {
        let mut app = create_test_app();
        app.currency = Currency::Idr;
        app.valuation = Some(Valuation {
            total: 1.0,
            currency: Currency::Usd,
            source: PriceSource::Live,
        });

        let content = rendered(&app);

        assert!(content.contains("Portfolio: --"));
    }

    #[test]
    fn test_chart_placeholder_when_empty() {
        let content = rendered(&create_test_app());
        assert!(content.contains("Chart data unavailable"));
    }

    #[test]
    fn test_chart_renders_series() {
        let mut app = create_test_app();
        app.chart = MarketChart {
            prices: vec![
                (1_700_000_000_000.0, 100.0),
                (1_700_001_800_000.0, 120.0),
                (1_700_003_600_000.0, 110.0),
            ],
        };

        let content = rendered(&app);

        assert!(content.contains("BITCOIN/USD · 1D"));
        assert!(!content.contains("Chart data unavailable"));
        assert!(content.contains("$120"));
    }

    #[test]
    fn test_toast_is_rendered() {
        let mut app = create_test_app();
        app.push_toast(ToastKind::Success, "Added 1 BTC to portfolio".to_string());

        let content = rendered(&app);

        assert!(content.contains("Added 1 BTC to portfolio"));
    }

    #[test]
    fn test_chart_label_formats() {
        let hourly = chart_label(1_700_000_000_000.0, 1);
        assert_eq!(hourly.len(), 5);
        assert!(hourly.ends_with(":00"));

        // Midday UTC keeps the same calendar date in any timezone within ±11h
        let daily = chart_label(1_704_110_400_000.0, 7);
        assert_eq!(daily, "2024-01-01");
    }

    #[test]
    fn test_change_colors() {
        assert_eq!(change_color(0.0), Color::Green);
        assert_eq!(change_color(-0.1), Color::Red);
    }
}
