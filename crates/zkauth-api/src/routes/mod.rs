//! # API Route Modules
//!
//! - `auth`: registration and login.
//! - `artifacts`: public circuit artifacts for client-side proving.

pub mod artifacts;
pub mod auth;
