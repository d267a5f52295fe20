use thiserror::Error;

/// A signed-in identity as reported by the identity service.
///
/// The core only reads it; the service creates it on sign-in and drops it
/// on sign-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// One auth-state notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn(AuthSession),
    SignedOut,
}

impl AuthChange {
    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            AuthChange::SignedIn(session) => Some(session),
            AuthChange::SignedOut => None,
        }
    }
}

impl From<Option<AuthSession>> for AuthChange {
    fn from(session: Option<AuthSession>) -> Self {
        match session {
            Some(s) => AuthChange::SignedIn(s),
            None => AuthChange::SignedOut,
        }
    }
}

pub const CONFIGURATION_NOT_FOUND: &str = "auth/configuration-not-found";
pub const NETWORK_REQUEST_FAILED: &str = "auth/network-request-failed";

/// Rejection from the identity service, tagged with an `auth/…` code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct AuthError {
    pub code: String,
    pub message: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The request URL carries the API key, so it is stripped first.
    pub fn network(err: reqwest::Error) -> Self {
        Self::new(NETWORK_REQUEST_FAILED, err.without_url().to_string())
    }

    /// The email/password sign-in method is not enabled for the project.
    /// Accepts the code with or without the `auth/` namespace.
    pub fn is_configuration_not_found(&self) -> bool {
        self.code == CONFIGURATION_NOT_FOUND || self.code == "configuration-not-found"
    }
}
