//! Login and signup submission logic, independent of any screen.
//!
//! Validation runs before the identity service is touched. Service
//! rejections are turned into text a user can act on by
//! [`auth_error_message`].

use crate::auth::{AuthError, AuthSession, IdentityService};
use thiserror::Error;

pub const MIN_USERNAME_LEN: usize = 3;

pub const CONFIGURATION_NOT_FOUND_MESSAGE: &str = "Authentication method not configured. \
Enable Email/Password in Firebase Console -> Authentication -> Sign-in method.";

pub const LOGIN_FALLBACK: &str = "Login failed";
pub const SIGNUP_FALLBACK: &str = "Signup failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Please choose a username (at least 3 characters)")]
    UsernameTooShort,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl FormError {
    /// Text for the form's error line.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            FormError::Validation(v) => v.to_string(),
            FormError::Auth(e) => auth_error_message(e, fallback),
        }
    }
}

/// Maps an identity-service rejection to display text.
///
/// A missing sign-in provider gets remediation instructions. Known codes get
/// a sentence. Anything else shows the code without its `auth/` namespace,
/// then the raw message, then `fallback`.
pub fn auth_error_message(err: &AuthError, fallback: &str) -> String {
    if err.is_configuration_not_found() {
        return CONFIGURATION_NOT_FOUND_MESSAGE.to_string();
    }

    let code = err.code.strip_prefix("auth/").unwrap_or(&err.code);
    let known = match code {
        "user-not-found" => Some("No account found for that email"),
        "wrong-password" | "invalid-credential" => Some("Incorrect email or password"),
        "invalid-email" => Some("That email address is not valid"),
        "missing-password" => Some("Please enter a password"),
        "email-already-in-use" => Some("An account already exists for that email"),
        "weak-password" => Some("Password should be at least 6 characters"),
        "too-many-requests" => Some("Too many attempts, try again later"),
        "user-disabled" => Some("This account has been disabled"),
        "network-request-failed" => Some("Network error, check your connection"),
        _ => None,
    };

    match known {
        Some(text) => text.to_string(),
        None if !code.is_empty() => code.to_string(),
        None if !err.message.is_empty() => err.message.clone(),
        None => fallback.to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupOutcome {
    pub session: AuthSession,
    /// False when the account was created but the display name could not be
    /// saved. The account stays usable.
    pub display_name_set: bool,
}

/// Checks a signup form in order: password confirmation, then username.
/// Returns the trimmed username.
pub fn validate_signup(form: &SignupForm) -> Result<&str, ValidationError> {
    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    let username = form.username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    Ok(username)
}

/// Signs in with a trimmed email. The password is sent as typed.
pub async fn login(
    identity: &dyn IdentityService,
    email: &str,
    password: &str,
) -> Result<AuthSession, FormError> {
    let email = email.trim();
    identity.sign_in(email, password).await.map_err(|e| {
        tracing::warn!(code = %e.code, "Login rejected");
        FormError::Auth(e)
    })
}

/// Validates, creates the account, then sets its display name.
///
/// A failed display-name update is logged and reported through
/// [`SignupOutcome::display_name_set`]; it does not fail the signup.
pub async fn signup(
    identity: &dyn IdentityService,
    form: &SignupForm,
) -> Result<SignupOutcome, FormError> {
    let username = validate_signup(form)?;

    let session = identity
        .create_account(form.email.trim(), &form.password)
        .await
        .map_err(|e| {
            tracing::warn!(code = %e.code, "Signup rejected");
            FormError::Auth(e)
        })?;

    let display_name_set = match identity.update_profile(username).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(uid = %session.uid, code = %e.code, "Could not set display name after signup");
            false
        }
    };

    Ok(SignupOutcome {
        session,
        display_name_set,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryIdentity;
    use pretty_assertions::assert_eq;

    fn form(username: &str, password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            email: "  neo@example.com ".into(),
            username: username.into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn test_mismatch_checked_before_username() {
        assert_eq!(
            validate_signup(&form("x", "abc123", "abc124")),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_username_is_trimmed_before_length_check() {
        assert_eq!(
            validate_signup(&form("  ab  ", "abc123", "abc123")),
            Err(ValidationError::UsernameTooShort)
        );
        assert_eq!(validate_signup(&form("  neo ", "abc123", "abc123")), Ok("neo"));
    }

    #[test]
    fn test_configuration_not_found_gets_remediation() {
        let err = AuthError::new("auth/configuration-not-found", "CONFIGURATION_NOT_FOUND");
        assert_eq!(
            auth_error_message(&err, LOGIN_FALLBACK),
            CONFIGURATION_NOT_FOUND_MESSAGE
        );
    }

    #[test]
    fn test_unknown_code_strips_namespace() {
        let err = AuthError::new("auth/quota-exceeded", "QUOTA_EXCEEDED");
        assert_eq!(auth_error_message(&err, LOGIN_FALLBACK), "quota-exceeded");
    }

    #[test]
    fn test_fallbacks() {
        let msg_only = AuthError::new("", "something broke");
        assert_eq!(auth_error_message(&msg_only, LOGIN_FALLBACK), "something broke");
        let nothing = AuthError::new("", "");
        assert_eq!(auth_error_message(&nothing, SIGNUP_FALLBACK), "Signup failed");
    }

    #[test]
    fn test_known_code_is_friendly() {
        let err = AuthError::new("auth/wrong-password", "INVALID_PASSWORD");
        assert_eq!(
            FormError::Auth(err).user_message(LOGIN_FALLBACK),
            "Incorrect email or password"
        );
    }

    #[tokio::test]
    async fn test_login_trims_email() {
        let identity = MemoryIdentity::new();
        identity.seed_account("neo@example.com", "matrix", None);
        let session = login(&identity, "  neo@example.com\n", "matrix").await.unwrap();
        assert_eq!(session.email.as_deref(), Some("neo@example.com"));
    }

    #[tokio::test]
    async fn test_signup_validation_makes_no_calls() {
        let identity = MemoryIdentity::new();
        let err = signup(&identity, &form("neo", "abc123", "zzz")).await.unwrap_err();
        assert_eq!(err, FormError::Validation(ValidationError::PasswordMismatch));
        assert_eq!(identity.create_account_calls(), 0);
    }

    #[tokio::test]
    async fn test_signup_sets_trimmed_display_name() {
        let identity = MemoryIdentity::new();
        let outcome = signup(&identity, &form("  neo  ", "abc123", "abc123")).await.unwrap();
        assert!(outcome.display_name_set);
        assert_eq!(outcome.session.email.as_deref(), Some("neo@example.com"));
        assert_eq!(
            identity.current_session().and_then(|s| s.display_name),
            Some("neo".to_string())
        );
    }

    #[tokio::test]
    async fn test_signup_survives_profile_failure() {
        let identity = MemoryIdentity::new();
        identity.fail_profile_updates(true);
        let outcome = signup(&identity, &form("neo", "abc123", "abc123")).await.unwrap();
        assert!(!outcome.display_name_set);
        assert!(identity.current_session().is_some());
    }
}
