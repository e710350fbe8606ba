//! Middleware module
//!
//! Contains the CORS layer, credential resolution and the internal token gate.

pub mod auth;
pub mod cors;
