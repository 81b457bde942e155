//! services/api/src/lib.rs
//!
//! The HTTP transport over the mock operation resolver, plus the adapters the
//! console client uses to keep a session and talk to it.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
