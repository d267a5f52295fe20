//! The identity service seam and its auth-state broadcast.
//!
//! Implementations keep an [`AuthStateHub`] and publish into it whenever a
//! session starts or ends. Observers call
//! [`IdentityService::on_auth_state_changed`] and get an [`AuthSubscription`];
//! dropping it unsubscribes.

use crate::auth::{AuthChange, AuthError, AuthSession};
use async_trait::async_trait;
use tokio::sync::watch;

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn create_account(&self, email: &str, password: &str)
        -> Result<AuthSession, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Sets the display name of the signed-in user. Does not emit an
    /// auth-state notification.
    async fn update_profile(&self, display_name: &str) -> Result<(), AuthError>;

    /// Subscribes to auth-state changes. The first [`AuthSubscription::next`]
    /// resolves immediately with the current state.
    fn on_auth_state_changed(&self) -> AuthSubscription;

    fn current_session(&self) -> Option<AuthSession>;
}

/// Holds the current session and fans changes out to subscribers.
#[derive(Debug)]
pub struct AuthStateHub {
    tx: watch::Sender<Option<AuthSession>>,
}

impl AuthStateHub {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.tx.subscribe(),
            primed: false,
        }
    }

    /// Replaces the session and notifies every subscriber.
    pub fn publish(&self, session: Option<AuthSession>) {
        tracing::debug!(
            signed_in = session.is_some(),
            subscribers = self.tx.receiver_count(),
            "Publishing auth state"
        );
        self.tx.send_replace(session);
    }

    /// Edits the current session in place without notifying subscribers.
    /// No-op when signed out.
    pub fn update_silently(&self, edit: impl FnOnce(&mut AuthSession)) {
        self.tx.send_if_modified(|current| {
            if let Some(session) = current.as_mut() {
                edit(session);
            }
            false
        });
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.tx.borrow().clone()
    }

    /// Live subscriptions, for leak checks.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for AuthStateHub {
    fn default() -> Self {
        Self::new()
    }
}

/// A live auth-state listener. Dropping it releases the subscription.
#[derive(Debug)]
pub struct AuthSubscription {
    rx: watch::Receiver<Option<AuthSession>>,
    primed: bool,
}

impl AuthSubscription {
    /// Waits for the next notification.
    ///
    /// The first call returns the current state without waiting. Changes
    /// published faster than the subscriber reads them are coalesced, so the
    /// latest state is always delivered. Returns `None` once the identity
    /// service is gone.
    pub async fn next(&mut self) -> Option<AuthChange> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone().into());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone().into())
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        tracing::debug!("Auth state subscription released");
    }
}
