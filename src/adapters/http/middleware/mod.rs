//! HTTP middleware for axum.
//!
//! - `auth` - Caller identity extractors

pub mod auth;

pub use auth::{AdminUser, AuthRejection, AuthenticatedUser, USER_ID_HEADER, USER_ROLE_HEADER};
