use crate::app::{App, Tab, View};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        Cow::Borrowed(hints(app))
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}

fn hints(app: &App) -> &'static str {
    match app.view {
        View::Splash => "[q]uit",
        View::Login => "[Tab]next field [Enter]log in [F2]sign up [Esc]back [Ctrl+c]quit",
        View::Signup => "[Tab]next field [Enter]sign up [F2]log in [Esc]back [Ctrl+c]quit",
        View::Main => match app.tab {
            Tab::Home => "[j/k]row [h/l]title [r]eload [Tab]switch tab [q]uit",
            Tab::Groups => "[Tab]switch tab [q]uit",
            Tab::Profile => "[o] sign out [Tab]switch tab [q]uit",
        },
    }
}
