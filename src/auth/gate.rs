//! Root-level routing driven by auth state.
//!
//! While mounted, [`SessionGate`] listens to the identity service and
//! replaces the current route with `/` when a session exists and `/login`
//! otherwise. It navigates on every notification, including the initial one,
//! and never after teardown.

use crate::auth::{AuthChange, IdentityService};
use crate::util::Liveness;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Signup,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/" => Some(Route::Home),
            "/login" => Some(Route::Login),
            "/signup" => Some(Route::Signup),
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// How a navigation affects history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKind {
    /// Swap the current route; no back entry.
    Replace,
    /// Push onto the history stack.
    Push,
}

#[async_trait]
pub trait Navigator: Send + Sync {
    async fn replace(&self, route: Route);
    async fn push(&self, route: Route);
}

/// Where the root should land for a given auth state.
pub fn route_for(change: &AuthChange) -> Route {
    match change {
        AuthChange::SignedIn(_) => Route::Home,
        AuthChange::SignedOut => Route::Login,
    }
}

pub struct SessionGate {
    liveness: Liveness,
    task: Option<JoinHandle<()>>,
}

impl SessionGate {
    /// Subscribes to auth state and starts routing. Must be called from
    /// within a tokio runtime.
    pub fn mount(identity: &dyn IdentityService, navigator: Arc<dyn Navigator>) -> Self {
        let liveness = Liveness::new();
        let mut subscription = identity.on_auth_state_changed();
        let live = liveness.clone();

        let task = tokio::spawn(async move {
            while let Some(change) = subscription.next().await {
                if !live.is_live() {
                    break;
                }
                let route = route_for(&change);
                tracing::info!(route = %route, signed_in = change.session().is_some(), "Auth state changed");
                navigator.replace(route).await;
            }
            tracing::debug!("Session gate listener finished");
        });

        Self {
            liveness,
            task: Some(task),
        }
    }

    /// Stops routing and waits until the auth subscription is released.
    pub async fn teardown(mut self) {
        self.liveness.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
            match task.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::error!(error = %e, "Session gate task failed"),
            }
        }
    }
}

impl Drop for SessionGate {
    fn drop(&mut self) {
        self.liveness.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate")
            .field("live", &self.liveness.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthSession;

    #[test]
    fn test_route_paths_round_trip() {
        for route in [Route::Home, Route::Login, Route::Signup] {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/groups"), None);
    }

    #[test]
    fn test_route_for_change() {
        let session = AuthSession {
            uid: "u".into(),
            email: None,
            display_name: None,
        };
        assert_eq!(route_for(&AuthChange::SignedIn(session)), Route::Home);
        assert_eq!(route_for(&AuthChange::SignedOut), Route::Login);
    }
}
