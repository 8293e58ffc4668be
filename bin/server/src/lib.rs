//! Authentication gate server.
//!
//! Puts a Heroku OAuth login in front of any axum router. See
//! [`auth::protect`] for the entry point.

pub mod auth;
pub mod config;
pub mod error;
