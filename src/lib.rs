//! Terminal movie browser backed by TMDB with email/password accounts.
//!
//! - `catalog` - category rows and the TMDB fetcher
//! - `auth` - identity service, session-driven routing, login and signup
//! - `config` - `config.toml` and environment overrides
//! - `app` / `ui` - terminal front end

pub mod app;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod ui;
pub mod util;
