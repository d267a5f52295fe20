//! Input handling for the TUI.
//!
//! Routes key presses to the handler for the current view.

use crate::app::{App, AppEvent, Tab, View};
use crate::auth::{NavKind, Route};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{spawn_login, spawn_signup, spawn_sign_out};
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    match app.view {
        View::Splash => Ok(match code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            _ => Action::Continue,
        }),
        View::Login | View::Signup => Ok(handle_form_input(app, code, event_tx)),
        View::Main => Ok(handle_main_input(app, code, event_tx)),
    }
}

/// Login and signup screens share field editing; they differ in what
/// Enter submits and where F2 leads.
fn handle_form_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    let view = app.view;

    match code {
        KeyCode::Enter => match view {
            View::Login => spawn_login(app, event_tx),
            View::Signup => spawn_signup(app, event_tx),
            _ => {}
        },
        KeyCode::F(2) => match view {
            View::Login => app.navigate(NavKind::Push, Route::Signup),
            View::Signup => app.navigate(NavKind::Push, Route::Login),
            _ => {}
        },
        KeyCode::Esc => {
            if !app.go_back() {
                return Action::Quit;
            }
        }
        code => {
            let Some(form) = app.active_form() else {
                return Action::Continue;
            };
            if form.submitting {
                return Action::Continue;
            }
            match code {
                KeyCode::Tab | KeyCode::Down => form.next_field(),
                KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                KeyCode::Backspace => form.backspace(),
                KeyCode::Char(c) => form.push_char(c),
                _ => {}
            }
        }
    }
    Action::Continue
}

fn handle_main_input(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) -> Action {
    match code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Tab => app.tab = app.tab.next(),
        KeyCode::Char('1') => app.tab = Tab::Home,
        KeyCode::Char('2') => app.tab = Tab::Groups,
        KeyCode::Char('3') => app.tab = Tab::Profile,
        _ => match app.tab {
            Tab::Home => handle_home_input(app, code),
            Tab::Profile => {
                if code == KeyCode::Char('o') {
                    spawn_sign_out(app, event_tx);
                }
            }
            Tab::Groups => {}
        },
    }
    Action::Continue
}

fn handle_home_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('j') | KeyCode::Down => app.row_down(),
        KeyCode::Char('k') | KeyCode::Up => app.row_up(),
        KeyCode::Char('l') | KeyCode::Right => app.item_right(),
        KeyCode::Char('h') | KeyCode::Left => app.item_left(),
        KeyCode::Char('r') => {
            // Remount to refetch every row
            app.mount_rows();
            app.set_status("Reloading rows...");
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{LOGIN_EMAIL, SIGNUP_EMAIL};
    use crate::auth::MemoryIdentity;
    use crate::catalog::CategoryFetcher;
    use secrecy::SecretString;
    use std::sync::Arc;

    fn test_app() -> (App, mpsc::Sender<AppEvent>, mpsc::Receiver<AppEvent>) {
        let fetcher = CategoryFetcher::new(
            reqwest::Client::new(),
            url::Url::parse("http://127.0.0.1:9/3").unwrap(),
            SecretString::from("k".to_string()),
        );
        let app = App::new(Arc::new(MemoryIdentity::new()), fetcher, Vec::new(), "");
        let (tx, rx) = mpsc::channel(8);
        (app, tx, rx)
    }

    fn key(app: &mut App, tx: &mpsc::Sender<AppEvent>, code: KeyCode) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).unwrap()
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_anywhere() {
        let (mut app, tx, _rx) = test_app();
        app.navigate(NavKind::Replace, Route::Login);
        let action = handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx).unwrap();
        assert!(matches!(action, Action::Quit));
    }

    #[tokio::test]
    async fn test_typing_edits_focused_field() {
        let (mut app, tx, _rx) = test_app();
        app.navigate(NavKind::Replace, Route::Login);
        for c in "neo".chars() {
            key(&mut app, &tx, KeyCode::Char(c));
        }
        key(&mut app, &tx, KeyCode::Tab);
        key(&mut app, &tx, KeyCode::Char('q'));
        assert_eq!(app.login_form.value(LOGIN_EMAIL), "neo");
        assert_eq!(app.login_form.focused, 1);
    }

    #[tokio::test]
    async fn test_f2_pushes_signup_and_esc_returns() {
        let (mut app, tx, _rx) = test_app();
        app.navigate(NavKind::Replace, Route::Login);
        key(&mut app, &tx, KeyCode::F(2));
        assert_eq!(app.view, View::Signup);
        key(&mut app, &tx, KeyCode::Char('x'));
        assert_eq!(app.signup_form.value(SIGNUP_EMAIL), "x");

        assert!(matches!(key(&mut app, &tx, KeyCode::Esc), Action::Continue));
        assert_eq!(app.view, View::Login);
        assert!(matches!(key(&mut app, &tx, KeyCode::Esc), Action::Quit));
    }

    #[tokio::test]
    async fn test_submit_reports_back_once() {
        let (mut app, tx, mut rx) = test_app();
        app.navigate(NavKind::Replace, Route::Login);
        key(&mut app, &tx, KeyCode::Enter);
        assert!(app.login_form.submitting);
        // Second Enter while in flight is ignored
        key(&mut app, &tx, KeyCode::Enter);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::LoginFinished(Err(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tab_switching() {
        let (mut app, tx, _rx) = test_app();
        app.navigate(NavKind::Replace, Route::Home);
        key(&mut app, &tx, KeyCode::Tab);
        assert_eq!(app.tab, Tab::Groups);
        key(&mut app, &tx, KeyCode::Char('3'));
        assert_eq!(app.tab, Tab::Profile);
    }
}
