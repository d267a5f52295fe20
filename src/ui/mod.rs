//! Terminal User Interface module.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `helpers` - Login, signup and sign-out tasks
//! - `render` - View rendering dispatch
//! - `home` - Category rows
//! - `forms` - Login and signup screens
//! - `profile` - Profile and Groups tabs
//! - `status` - Status bar widget

mod events;
mod forms;
mod helpers;
mod home;
mod input;
mod loop_runner;
mod profile;
mod render;
mod status;

pub use loop_runner::{run, Action};
pub use profile::{profile_fields, GROUPS_PLACEHOLDER, NO_USERNAME};
