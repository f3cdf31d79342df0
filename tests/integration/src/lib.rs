//! Integration test utilities for the real-time gateway
//!
//! This crate provides helpers for running end-to-end tests against
//! the WebSocket endpoint and the HTTP routes.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
