//! Identity: sessions, the service seam and its two backends, root routing,
//! and the login/signup flows.

mod firebase;
mod forms;
mod gate;
mod memory;
mod service;
mod session;

pub use firebase::{map_rest_error, FirebaseIdentity};
pub use forms::{
    auth_error_message, login, signup, validate_signup, FormError, SignupForm, SignupOutcome,
    ValidationError, CONFIGURATION_NOT_FOUND_MESSAGE, LOGIN_FALLBACK, MIN_USERNAME_LEN,
    SIGNUP_FALLBACK,
};
pub use gate::{route_for, NavKind, Navigator, Route, SessionGate};
pub use memory::MemoryIdentity;
pub use service::{AuthStateHub, AuthSubscription, IdentityService};
pub use session::{AuthChange, AuthError, AuthSession, CONFIGURATION_NOT_FOUND, NETWORK_REQUEST_FAILED};
