//! Background task event processing.

use crate::app::{App, AppEvent};

/// Applies one background event to app state.
pub(super) fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Navigate { kind, route } => app.navigate(kind, route),
        AppEvent::LoginFinished(result) => {
            app.login_form.submitting = false;
            match result {
                // The session gate moves us to Home
                Ok(()) => app.login_form.clear_secrets(),
                Err(message) => {
                    tracing::debug!(error = %message, "Login failed, user notified");
                    app.login_form.error = Some(message);
                }
            }
        }
        AppEvent::SignupFinished(result) => {
            app.signup_form.submitting = false;
            match result {
                Ok(display_name_set) => {
                    app.signup_form.clear_secrets();
                    if !display_name_set {
                        app.set_status("Account created, but the username could not be saved");
                    }
                }
                Err(message) => {
                    tracing::debug!(error = %message, "Signup failed, user notified");
                    app.signup_form.error = Some(message);
                }
            }
        }
        AppEvent::SignOutFinished => {
            app.sign_out_pending = false;
        }
        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error, "Background task panicked");
            app.login_form.submitting = false;
            app.signup_form.submitting = false;
            app.set_status(format!("Internal error in {} task", task));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::View;
    use crate::auth::{MemoryIdentity, NavKind, Route};
    use crate::catalog::CategoryFetcher;
    use secrecy::SecretString;
    use std::sync::Arc;

    fn test_app() -> App {
        let fetcher = CategoryFetcher::new(
            reqwest::Client::new(),
            url::Url::parse("http://127.0.0.1:9/3").unwrap(),
            SecretString::from("k".to_string()),
        );
        App::new(Arc::new(MemoryIdentity::new()), fetcher, Vec::new(), "")
    }

    #[tokio::test]
    async fn test_login_failure_shows_error_and_unlocks() {
        let mut app = test_app();
        app.login_form.submitting = true;
        handle_app_event(&mut app, AppEvent::LoginFinished(Err("Incorrect email or password".into())));
        assert!(!app.login_form.submitting);
        assert_eq!(app.login_form.error.as_deref(), Some("Incorrect email or password"));
    }

    #[tokio::test]
    async fn test_signup_without_username_sets_status() {
        let mut app = test_app();
        app.signup_form.submitting = true;
        handle_app_event(&mut app, AppEvent::SignupFinished(Ok(false)));
        assert!(!app.signup_form.submitting);
        assert!(app.signup_form.error.is_none());
        assert!(app.status_message.is_some());
    }

    #[tokio::test]
    async fn test_navigate_event() {
        let mut app = test_app();
        handle_app_event(
            &mut app,
            AppEvent::Navigate {
                kind: NavKind::Replace,
                route: Route::Login,
            },
        );
        assert_eq!(app.view, View::Login);
    }

    #[tokio::test]
    async fn test_panic_event_unlocks_forms() {
        let mut app = test_app();
        app.login_form.submitting = true;
        handle_app_event(
            &mut app,
            AppEvent::TaskPanicked {
                task: "login",
                error: "boom".into(),
            },
        );
        assert!(!app.login_form.submitting);
        assert!(app.status_message.is_some());
    }
}
