//! Profile and Groups tabs.

use crate::app::App;
use crate::auth::AuthSession;
use crate::util::strip_control_chars;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub const NO_USERNAME: &str = "No username set";
pub const GROUPS_PLACEHOLDER: &str = "See and join groups with shared interests.";

/// Display name and email for the profile card.
pub fn profile_fields(session: Option<&AuthSession>) -> (String, String) {
    let name = session
        .and_then(|s| s.display_name.as_deref())
        .map(|n| strip_control_chars(n).into_owned())
        .unwrap_or_else(|| NO_USERNAME.to_string());
    let email = session
        .and_then(|s| s.email.as_deref())
        .map(|e| strip_control_chars(e).into_owned())
        .unwrap_or_default();
    (name, email)
}

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let session = app.identity.current_session();
    let (name, email) = profile_fields(session.as_ref());

    let action = if app.sign_out_pending {
        Span::styled("Signing out...", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("[o] Sign out")
    };

    let lines = vec![
        Line::from(Span::styled(name, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(email, Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(action),
    ];
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Profile"));
    f.render_widget(paragraph, area);
}

pub fn render_groups(f: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new(GROUPS_PLACEHOLDER)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Groups"));
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_display_name_falls_back() {
        let session = AuthSession {
            uid: "u".into(),
            email: Some("neo@example.com".into()),
            display_name: None,
        };
        assert_eq!(
            profile_fields(Some(&session)),
            (NO_USERNAME.to_string(), "neo@example.com".to_string())
        );
    }

    #[test]
    fn test_signed_out_profile() {
        assert_eq!(profile_fields(None), (NO_USERNAME.to_string(), String::new()));
    }
}
