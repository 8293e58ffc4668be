//! Core utilities for the bouncer authentication gate.
//!
//! This crate provides the error handling foundation and the clock
//! abstraction shared by the domain and server crates.

pub mod clock;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Result;
