//! Home tab: one horizontal strip per category row.

use crate::app::App;
use crate::catalog::{ListItem, RowState};
use crate::util::truncate_to_width;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Width of one title cell in a strip.
const ITEM_WIDTH: usize = 20;
const ROW_HEIGHT: u16 = 3;

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let detail_height = 2;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(detail_height)])
        .split(area);

    let visible = (chunks[0].height / ROW_HEIGHT).max(1) as usize;
    // Keep the selected row on screen
    let first = app.selected_row.saturating_sub(visible.saturating_sub(1));

    let mut y = chunks[0].y;
    for (i, row) in app.rows.iter().enumerate().skip(first).take(visible) {
        let rect = Rect::new(chunks[0].x, y, chunks[0].width, ROW_HEIGHT);
        y += ROW_HEIGHT;

        let selected = i == app.selected_row;
        let border_style = if selected {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let highlighted = app.selected_items.get(i).copied().unwrap_or(0);

        let line = {
            let state = row.state();
            row_line(&state, selected, highlighted, rect.width, app.spinner_frame)
        };

        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(border_style)
            .title(row.label().to_string());
        f.render_widget(Paragraph::new(line).block(block), rect);
    }

    if app.rows.is_empty() {
        f.render_widget(Paragraph::new("No rows configured"), chunks[0]);
    }

    render_detail(f, app, chunks[1]);
}

/// One line of content for a row in the given state.
fn row_line(
    state: &RowState,
    selected: bool,
    highlighted: usize,
    width: u16,
    spinner_frame: usize,
) -> Line<'static> {
    match state {
        RowState::Loading => Line::from(format!(
            "{} Loading...",
            SPINNER[spinner_frame % SPINNER.len()]
        )),
        RowState::Failure(message) => Line::from(Span::styled(
            truncate_to_width(message, width as usize).into_owned(),
            Style::default().fg(Color::Red),
        )),
        RowState::Success(items) if items.is_empty() => Line::from(Span::styled(
            "No titles",
            Style::default().fg(Color::DarkGray),
        )),
        RowState::Success(items) => item_strip(items, selected, highlighted, width as usize),
    }
}

/// Lays out titles left to right, scrolled so the highlighted one is visible.
fn item_strip(items: &[ListItem], selected: bool, highlighted: usize, width: usize) -> Line<'static> {
    let cell = ITEM_WIDTH + 2;
    let per_screen = (width / cell).max(1);
    let start = highlighted.saturating_sub(per_screen - 1);

    let spans: Vec<Span<'static>> = items
        .iter()
        .enumerate()
        .skip(start)
        .take(per_screen)
        .flat_map(|(i, item)| {
            let title = truncate_to_width(&item.title, ITEM_WIDTH);
            let padded = format!("{:<w$}", title, w = ITEM_WIDTH);
            let style = if selected && i == highlighted {
                Style::default()
                    .bg(Color::DarkGray)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            [Span::styled(padded, style), Span::raw("  ")]
        })
        .collect();
    Line::from(spans)
}

/// Title and poster URL of the highlighted item.
fn render_detail(f: &mut Frame, app: &App, area: Rect) {
    let Some(item) = app.selected_item() else {
        return;
    };
    let poster = item
        .poster_url(&app.image_base_url)
        .unwrap_or_else(|| "no poster".to_string());
    let width = area.width as usize;
    let lines = vec![
        Line::from(Span::styled(
            truncate_to_width(&item.title, width).into_owned(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            truncate_to_width(&poster, width).into_owned(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str) -> ListItem {
        ListItem {
            id: title.into(),
            title: title.into(),
            image_path: None,
        }
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_loading_line_has_spinner() {
        let line = row_line(&RowState::Loading, false, 0, 80, 3);
        assert_eq!(text(&line), "⠸ Loading...");
    }

    #[test]
    fn test_failure_line_is_red() {
        let line = row_line(&RowState::Failure("boom".into()), false, 0, 80, 0);
        assert_eq!(text(&line), "boom");
        assert_eq!(line.spans[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn test_empty_success() {
        let line = row_line(&RowState::Success(vec![]), false, 0, 80, 0);
        assert_eq!(text(&line), "No titles");
    }

    #[test]
    fn test_strip_scrolls_to_highlight() {
        let items: Vec<ListItem> = (0..10).map(|i| item(&format!("M{}", i))).collect();
        // 44 columns fit two cells
        let line = item_strip(&items, true, 5, 44);
        let rendered = text(&line);
        assert!(rendered.contains("M4"));
        assert!(rendered.contains("M5"));
        assert!(!rendered.contains("M3"));
    }
}
