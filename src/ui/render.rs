//! Render functions for the TUI.
//!
//! Dispatches on the current view and, inside the main view, on the
//! selected tab.

use crate::app::{App, Tab, View};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Tabs},
    Frame,
};

use super::{forms, home, profile, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 48;
pub(super) const MIN_HEIGHT: u16 = 12;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    match app.view {
        View::Splash => render_splash(f, chunks[0]),
        View::Login => forms::render(f, &app.login_form, View::Login, chunks[0]),
        View::Signup => forms::render(f, &app.signup_form, View::Signup, chunks[0]),
        View::Main => render_main(f, app, chunks[0]),
    }
    status::render(f, app, chunks[1]);
}

fn render_splash(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "watchly",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Checking your session..."),
    ];
    let top = area.y + area.height.saturating_sub(3) / 2;
    let rect = Rect::new(area.x, top, area.width, 3.min(area.height));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), rect);
}

fn render_main(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("|");
    f.render_widget(tabs, chunks[0]);

    match app.tab {
        Tab::Home => home::render(f, app, chunks[1]),
        Tab::Groups => profile::render_groups(f, chunks[1]),
        Tab::Profile => profile::render(f, app, chunks[1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryIdentity, NavKind, Route};
    use crate::catalog::CategoryFetcher;
    use ratatui::{backend::TestBackend, Terminal};
    use secrecy::SecretString;
    use std::sync::Arc;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn test_app() -> App {
        let fetcher = CategoryFetcher::new(
            reqwest::Client::new(),
            url::Url::parse("http://127.0.0.1:9/3").unwrap(),
            SecretString::from("k".to_string()),
        );
        App::new(
            Arc::new(MemoryIdentity::new()),
            fetcher,
            crate::catalog::default_rows(),
            "",
        )
    }

    #[tokio::test]
    async fn test_home_shows_row_labels_while_loading() {
        let mut app = test_app();
        app.navigate(NavKind::Replace, Route::Home);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Trending"));
        assert!(text.contains("Loading..."));
    }

    #[tokio::test]
    async fn test_login_form_renders_error() {
        let mut app = test_app();
        app.navigate(NavKind::Replace, Route::Login);
        app.login_form.error = Some("Incorrect email or password".into());
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("Incorrect email or password"));
    }

    #[tokio::test]
    async fn test_too_small_terminal() {
        let app = test_app();
        let mut terminal = Terminal::new(TestBackend::new(30, 8)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("Terminal too small"));
    }
}
