//! Utility functions shared across the catalog, auth and UI layers.
//!
//! - **Base URL validation**: configured service endpoints must be HTTPS
//!   (plain HTTP is tolerated for localhost so tests can point at a mock)
//! - **Text processing**: display-width aware truncation and control
//!   character stripping for remote strings
//! - **Bounded body reads**: streaming response reads with a byte cap
//! - **Liveness**: the cooperative cancellation flag handed to background tasks
//! - **Panic capture**: converting a panicking background future into an error
//!
//! # Examples
//!
//! ```
//! use watchly::util::{truncate_to_width, validate_base_url};
//!
//! let url = validate_base_url("https://api.themoviedb.org/3").unwrap();
//! assert_eq!(url.host_str(), Some("api.themoviedb.org"));
//!
//! assert_eq!(truncate_to_width("The Shawshank Redemption", 10), "The Sha...");
//! ```

mod body;
mod liveness;
mod task;
mod text;
mod url_validator;

pub use body::{read_limited_body, BodyReadError};
pub use liveness::Liveness;
pub use task::catch_task_panic;
pub use text::{display_width, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_base_url, UrlValidationError};
