//! Email/password identity over the Firebase Identity Toolkit REST API.
//!
//! Endpoints used, all `POST {base}/v1/accounts:<method>?key=<api key>`:
//! `signInWithPassword`, `signUp` and `update`. REST error messages such as
//! `EMAIL_NOT_FOUND` are translated to the `auth/…` codes the client SDKs
//! report, so callers see one vocabulary regardless of backend.
//!
//! Sign-out is local: the cached ID token is discarded and subscribers are
//! told the session ended.

use crate::auth::{AuthError, AuthSession, AuthStateHub, AuthSubscription, IdentityService};
use crate::util::{read_limited_body, BodyReadError};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use url::Url;

const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    id_token: &'a str,
    display_name: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct FirebaseIdentity {
    client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    hub: AuthStateHub,
    id_token: Mutex<Option<SecretString>>,
}

impl std::fmt::Debug for FirebaseIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseIdentity")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("signed_in", &self.hub.current().is_some())
            .finish()
    }
}

impl FirebaseIdentity {
    pub fn new(client: reqwest::Client, base_url: Url, api_key: SecretString) -> Self {
        Self {
            client,
            base_url,
            api_key,
            hub: AuthStateHub::new(),
            id_token: Mutex::new(None),
        }
    }

    pub fn into_shared(self) -> Arc<dyn IdentityService> {
        Arc::new(self)
    }

    /// Live auth-state subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    fn endpoint(&self, method: &str) -> Result<Url, AuthError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AuthError::new("auth/invalid-api-url", "identity base URL cannot be a base"))?
            .pop_if_empty()
            .push("v1")
            .push(&format!("accounts:{}", method));
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose_secret());
        Ok(url)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<AccountResponse, AuthError> {
        let url = self.endpoint(method)?;
        tracing::debug!(method, "Identity request");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(AuthError::network)?;

        let status = response.status();
        let bytes = read_limited_body(response, MAX_RESPONSE_SIZE)
            .await
            .map_err(|e| match e {
                BodyReadError::TooLarge { .. } => {
                    AuthError::new("auth/internal-error", "Response too large")
                }
                BodyReadError::Network(e) => AuthError::network(e),
            })?;

        if !status.is_success() {
            let rest_message = serde_json::from_slice::<ErrorEnvelope>(&bytes)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            let err = map_rest_error(&rest_message);
            tracing::warn!(method, status = status.as_u16(), code = %err.code, "Identity request rejected");
            return Err(err);
        }

        serde_json::from_slice::<AccountResponse>(&bytes)
            .map_err(|e| AuthError::new("auth/internal-error", format!("Malformed response: {}", e)))
    }

    fn start_session(&self, account: AccountResponse) -> AuthSession {
        let session = AuthSession {
            uid: account.local_id,
            email: account.email.filter(|e| !e.is_empty()),
            display_name: account.display_name.filter(|n| !n.is_empty()),
        };
        *self.id_token.lock().unwrap_or_else(|e| e.into_inner()) =
            account.id_token.map(SecretString::from);
        self.hub.publish(Some(session.clone()));
        session
    }

    fn current_token(&self) -> Option<String> {
        self.id_token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|t| t.expose_secret().to_string())
    }
}

#[async_trait]
impl IdentityService for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let account = self
            .post(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        tracing::info!(uid = %account.local_id, "Signed in");
        Ok(self.start_session(account))
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let account = self
            .post(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        tracing::info!(uid = %account.local_id, "Account created");
        Ok(self.start_session(account))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.id_token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.hub.publish(None);
        tracing::info!("Signed out");
        Ok(())
    }

    async fn update_profile(&self, display_name: &str) -> Result<(), AuthError> {
        let token = self
            .current_token()
            .ok_or_else(|| AuthError::new("auth/no-current-user", "No user is signed in"))?;
        let account = self
            .post(
                "update",
                &UpdateRequest {
                    id_token: &token,
                    display_name,
                    return_secure_token: false,
                },
            )
            .await?;
        let name = account
            .display_name
            .unwrap_or_else(|| display_name.to_string());
        self.hub
            .update_silently(|session| session.display_name = Some(name));
        Ok(())
    }

    fn on_auth_state_changed(&self) -> AuthSubscription {
        self.hub.subscribe()
    }

    fn current_session(&self) -> Option<AuthSession> {
        self.hub.current()
    }
}

/// Translates an Identity Toolkit error message into an `auth/…` error.
///
/// Messages may carry detail after a colon, e.g.
/// `WEAK_PASSWORD : Password should be at least 6 characters`.
pub fn map_rest_error(rest_message: &str) -> AuthError {
    let (key, detail) = match rest_message.split_once(':') {
        Some((k, d)) => (k.trim(), d.trim()),
        None => (rest_message.trim(), ""),
    };

    let code = match key {
        "EMAIL_NOT_FOUND" => "auth/user-not-found".to_string(),
        "INVALID_PASSWORD" => "auth/wrong-password".to_string(),
        "INVALID_LOGIN_CREDENTIALS" => "auth/invalid-credential".to_string(),
        "USER_DISABLED" => "auth/user-disabled".to_string(),
        "EMAIL_EXISTS" => "auth/email-already-in-use".to_string(),
        "INVALID_EMAIL" => "auth/invalid-email".to_string(),
        "MISSING_PASSWORD" => "auth/missing-password".to_string(),
        "WEAK_PASSWORD" => "auth/weak-password".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests".to_string(),
        "OPERATION_NOT_ALLOWED" => "auth/operation-not-allowed".to_string(),
        "CONFIGURATION_NOT_FOUND" => "auth/configuration-not-found".to_string(),
        "INVALID_ID_TOKEN" => "auth/invalid-user-token".to_string(),
        "TOKEN_EXPIRED" => "auth/user-token-expired".to_string(),
        k if k.starts_with("API key not valid") || k == "API_KEY_INVALID" => {
            "auth/invalid-api-key".to_string()
        }
        other => format!("auth/{}", other.to_lowercase().replace('_', "-")),
    };

    let message = if detail.is_empty() { key } else { detail };
    AuthError::new(code, message)
}
