//! # eCourts Common
//!
//! Shared types and utilities for the eCourts relay components.
//!
//! ## Modules
//! - `cookies` - Cookie jar type, parsing/formatting, session-id heuristic
//! - `error` - Common error types
//! - `constants` - Upstream endpoints and shared defaults

pub mod constants;
pub mod cookies;
pub mod error;

pub use cookies::{CookieJar, CookieJarInput};
pub use error::RelayError;
