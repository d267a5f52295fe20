//! Background tasks spawned from the UI.
//!
//! Each task reports back through [`AppEvent`] and is wrapped in
//! [`catch_task_panic`] so a panic surfaces as `AppEvent::TaskPanicked`
//! instead of silently vanishing.

use crate::app::{App, AppEvent, LOGIN_EMAIL, LOGIN_PASSWORD};
use crate::auth::{self, LOGIN_FALLBACK, SIGNUP_FALLBACK};
use crate::util::catch_task_panic;
use tokio::sync::mpsc;

async fn send(tx: &mpsc::Sender<AppEvent>, event: AppEvent, name: &'static str) {
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, event = name, "Channel send failed (receiver dropped)");
    }
}

/// Submits the login form. Ignored while a submission is in flight.
pub(super) fn spawn_login(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.login_form.submitting {
        return;
    }
    app.login_form.submitting = true;
    app.login_form.error = None;

    let identity = app.identity.clone();
    let email = app.login_form.value(LOGIN_EMAIL).to_string();
    let password = app.login_form.value(LOGIN_PASSWORD).to_string();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let outcome = catch_task_panic(auth::login(identity.as_ref(), &email, &password)).await;
        match outcome {
            Ok(result) => {
                let result = result
                    .map(|_| ())
                    .map_err(|e| e.user_message(LOGIN_FALLBACK));
                send(&tx, AppEvent::LoginFinished(result), "LoginFinished").await;
            }
            Err(panic_msg) => {
                tracing::error!(error = %panic_msg, "Login task panicked");
                send(
                    &tx,
                    AppEvent::TaskPanicked {
                        task: "login",
                        error: panic_msg,
                    },
                    "TaskPanicked",
                )
                .await;
            }
        }
    });
}

/// Submits the signup form. Ignored while a submission is in flight.
pub(super) fn spawn_signup(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.signup_form.submitting {
        return;
    }
    app.signup_form.submitting = true;
    app.signup_form.error = None;

    let identity = app.identity.clone();
    let request = app.signup_form.to_signup();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        match catch_task_panic(auth::signup(identity.as_ref(), &request)).await {
            Ok(result) => {
                let result = result
                    .map(|outcome| outcome.display_name_set)
                    .map_err(|e| e.user_message(SIGNUP_FALLBACK));
                send(&tx, AppEvent::SignupFinished(result), "SignupFinished").await;
            }
            Err(panic_msg) => {
                tracing::error!(error = %panic_msg, "Signup task panicked");
                send(
                    &tx,
                    AppEvent::TaskPanicked {
                        task: "signup",
                        error: panic_msg,
                    },
                    "TaskPanicked",
                )
                .await;
            }
        }
    });
}

/// Signs out. Failures are logged and otherwise ignored; the session gate
/// routes to login once the identity service reports the sign-out.
pub(super) fn spawn_sign_out(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if app.sign_out_pending {
        return;
    }
    app.sign_out_pending = true;

    let identity = app.identity.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        match catch_task_panic(identity.sign_out()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(code = %e.code, "Sign-out failed, ignoring"),
            Err(panic_msg) => tracing::error!(error = %panic_msg, "Sign-out task panicked"),
        }
        send(&tx, AppEvent::SignOutFinished, "SignOutFinished").await;
    });
}
