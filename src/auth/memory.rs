//! Process-local identity service.
//!
//! Backs `--local-auth` and the test suites. Accounts live in a map keyed by
//! email and vanish on exit. Validation follows the hosted service closely
//! enough that the UI error paths are reachable offline.

use crate::auth::{AuthError, AuthSession, AuthStateHub, AuthSubscription, IdentityService};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug)]
struct Account {
    uid: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
    current_email: Mutex<Option<String>>,
    hub: AuthStateHub,
    next_uid: AtomicUsize,
    password_auth_disabled: AtomicBool,
    fail_profile_updates: AtomicBool,
    sign_in_calls: AtomicUsize,
    create_account_calls: AtomicUsize,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every sign-in and sign-up fail with
    /// `auth/configuration-not-found`, as the hosted service does when the
    /// email/password provider is off.
    pub fn disable_password_auth(&self, disabled: bool) {
        self.password_auth_disabled.store(disabled, Ordering::Relaxed);
    }

    pub fn fail_profile_updates(&self, fail: bool) {
        self.fail_profile_updates.store(fail, Ordering::Relaxed);
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::Relaxed)
    }

    pub fn create_account_calls(&self) -> usize {
        self.create_account_calls.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    /// Publishes a session directly, bypassing credentials. Simulates the
    /// hosted service restoring or expiring a session on its own.
    pub fn force_session(&self, session: Option<AuthSession>) {
        *self.current_email.lock().unwrap_or_else(|e| e.into_inner()) =
            session.as_ref().and_then(|s| s.email.clone());
        self.hub.publish(session);
    }

    fn check_enabled(&self) -> Result<(), AuthError> {
        if self.password_auth_disabled.load(Ordering::Relaxed) {
            return Err(AuthError::new(
                "auth/configuration-not-found",
                "CONFIGURATION_NOT_FOUND",
            ));
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !email.contains(' '),
        None => false,
    }
}

#[async_trait]
impl IdentityService for MemoryIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::Relaxed);
        self.check_enabled()?;
        if !looks_like_email(email) {
            return Err(AuthError::new("auth/invalid-email", "INVALID_EMAIL"));
        }

        let session = {
            let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
            let account = accounts
                .get(email)
                .ok_or_else(|| AuthError::new("auth/user-not-found", "EMAIL_NOT_FOUND"))?;
            if account.password != password {
                return Err(AuthError::new("auth/wrong-password", "INVALID_PASSWORD"));
            }
            AuthSession {
                uid: account.uid.clone(),
                email: Some(email.to_string()),
                display_name: account.display_name.clone(),
            }
        };

        *self.current_email.lock().unwrap_or_else(|e| e.into_inner()) = Some(email.to_string());
        self.hub.publish(Some(session.clone()));
        tracing::info!(uid = %session.uid, "Signed in (local)");
        Ok(session)
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        self.create_account_calls.fetch_add(1, Ordering::Relaxed);
        self.check_enabled()?;
        if !looks_like_email(email) {
            return Err(AuthError::new("auth/invalid-email", "INVALID_EMAIL"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::new(
                "auth/weak-password",
                "Password should be at least 6 characters",
            ));
        }

        let session = {
            let mut accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
            if accounts.contains_key(email) {
                return Err(AuthError::new("auth/email-already-in-use", "EMAIL_EXISTS"));
            }
            let n = self.next_uid.fetch_add(1, Ordering::Relaxed) + 1;
            let account = Account {
                uid: format!("local-{}", n),
                password: password.to_string(),
                display_name: None,
            };
            let session = AuthSession {
                uid: account.uid.clone(),
                email: Some(email.to_string()),
                display_name: None,
            };
            accounts.insert(email.to_string(), account);
            session
        };

        *self.current_email.lock().unwrap_or_else(|e| e.into_inner()) = Some(email.to_string());
        self.hub.publish(Some(session.clone()));
        tracing::info!(uid = %session.uid, "Account created (local)");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.current_email.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.hub.publish(None);
        Ok(())
    }

    async fn update_profile(&self, display_name: &str) -> Result<(), AuthError> {
        if self.fail_profile_updates.load(Ordering::Relaxed) {
            return Err(AuthError::new("auth/internal-error", "profile update rejected"));
        }
        let email = self
            .current_email
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| AuthError::new("auth/no-current-user", "No user is signed in"))?;

        if let Some(account) = self
            .accounts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&email)
        {
            account.display_name = Some(display_name.to_string());
        }
        self.hub
            .update_silently(|s| s.display_name = Some(display_name.to_string()));
        Ok(())
    }

    fn on_auth_state_changed(&self) -> AuthSubscription {
        self.hub.subscribe()
    }

    fn current_session(&self) -> Option<AuthSession> {
        self.hub.current()
    }
}

impl MemoryIdentity {
    /// Registers an account without signing in or counting a call.
    pub fn seed_account(&self, email: &str, password: &str, display_name: Option<&str>) {
        let n = self.next_uid.fetch_add(1, Ordering::Relaxed) + 1;
        let account = Account {
            uid: format!("local-{}", n),
            password: password.to_string(),
            display_name: display_name.map(str::to_owned),
        };
        self.accounts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(email.to_string(), account);
    }

    /// Signs in a seeded account without going through the credential check.
    pub fn restore_session(&self, email: &str) -> Option<AuthSession> {
        let accounts = self.accounts.lock().unwrap_or_else(|e| e.into_inner());
        let account = accounts.get(email)?;
        let session = AuthSession {
            uid: account.uid.clone(),
            email: Some(email.to_string()),
            display_name: account.display_name.clone(),
        };
        drop(accounts);
        *self.current_email.lock().unwrap_or_else(|e| e.into_inner()) = Some(email.to_string());
        self.hub.publish(Some(session.clone()));
        Some(session)
    }
}
