//! Authentication utilities

mod jwt;

pub use jwt::{AuthError, Claims, JwtService};
