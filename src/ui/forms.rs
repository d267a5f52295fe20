//! Login and signup screens.

use crate::app::{Form, View};
use crate::util::truncate_to_width;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const FORM_WIDTH: u16 = 56;

pub fn render(f: &mut Frame, form: &Form, view: View, area: Rect) {
    let (title, busy, alt) = match view {
        View::Signup => ("Sign up", "Creating account...", "Already have an account? [F2] Log in"),
        _ => ("Log in", "Signing in...", "No account? [F2] Sign up"),
    };

    let height = form.fields.len() as u16 * 2 + 8;
    let rect = centered(area, FORM_WIDTH.min(area.width), height.min(area.height));
    let inner_width = rect.width.saturating_sub(4) as usize;

    let mut lines: Vec<Line> = Vec::with_capacity(form.fields.len() * 2 + 4);
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focused;
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let shown = if field.masked {
            "•".repeat(field.value.chars().count())
        } else {
            field.value.clone()
        };
        let cursor = if focused && !form.submitting { "_" } else { "" };
        lines.push(Line::from(Span::styled(field.label, label_style)));
        lines.push(Line::from(format!(
            "{}{}",
            truncate_to_width(&shown, inner_width.saturating_sub(1)),
            cursor
        )));
    }

    lines.push(Line::from(""));
    if form.submitting {
        lines.push(Line::from(Span::styled(busy, Style::default().fg(Color::Yellow))));
    } else if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from("[Enter] submit"));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(alt, Style::default().fg(Color::DarkGray))));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(paragraph, rect);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);
    horizontal[1]
}
