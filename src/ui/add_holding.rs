//! Add-holding form
//!
//! Modal with the list of selectable assets and the amount being typed.

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::centered_rect;
use crate::app::App;
use crate::data::FALLBACK_COINS;

/// Renders the add-holding modal over the dashboard
pub fn render(frame: &mut Frame, app: &App) {
    let height = FALLBACK_COINS.len() as u16 + 7;
    let area = centered_rect(44, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Add Holding ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(inner);

    let selected = app.add_form.selected % FALLBACK_COINS.len();
    let assets: Vec<Line> = FALLBACK_COINS
        .iter()
        .enumerate()
        .map(|(index, coin)| {
            let is_selected = index == selected;
            let cursor = if is_selected { "\u{25B8} " } else { "  " };
            let style = if is_selected {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let held = app.portfolio.quantity(coin.id);
            let mut spans = vec![
                Span::styled(cursor, style),
                Span::styled(format!("{:<12}", coin.name), style),
                Span::styled(
                    format!("{:<6}", coin.symbol.to_uppercase()),
                    Style::default().fg(Color::Gray),
                ),
            ];
            if held > 0.0 {
                spans.push(Span::styled(
                    format!("held {}", held),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(assets), chunks[0]);

    let amount = Line::from(vec![
        Span::styled("Amount: ", Style::default().fg(Color::White)),
        Span::styled(
            format!("{}_", app.add_form.amount),
            Style::default().fg(Color::Yellow),
        ),
    ]);
    frame.render_widget(Paragraph::new(vec![Line::from(""), amount]), chunks[1]);

    let hints = Line::from(vec![
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Asset  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Add  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" Cancel"),
    ]);
    frame.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}
