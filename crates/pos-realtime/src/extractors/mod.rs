//! Custom extractors for Axum handlers

mod auth;

pub use auth::{AuthIdentity, PrivilegedIdentity};
