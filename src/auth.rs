//! HTTP Basic authentication primitives.
//!
//! The transport hands the raw `Authorization` header to
//! [`basic_credentials`]; verification against the user table lives in
//! [`crate::storage::user_store::UserStore`]. The sync endpoint requires the
//! resulting identity to carry the admin role.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// User role, as stored in the `role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    /// May submit sale batches via the sync endpoint.
    Admin,
    /// Everyone else; read-only from the core's point of view.
    Staff,
}

/// Authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authentication/authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No `Authorization` header was sent.
    #[error("missing credentials")]
    MissingCredentials,

    /// The `Authorization` header is not well-formed Basic auth.
    #[error("malformed authorization header")]
    MalformedHeader,

    /// Unknown user or wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Authenticated, but the role does not permit the operation.
    #[error("admin role required")]
    Forbidden,
}

/// Extract a `(username, password)` pair from a Basic `Authorization` header.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), AuthError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?;
    let value = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
    let encoded = value
        .strip_prefix("Basic ")
        .ok_or(AuthError::MalformedHeader)?;

    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|_| AuthError::MalformedHeader)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader)?;

    let (username, password) = decoded.split_once(':').ok_or(AuthError::MalformedHeader)?;
    Ok((username.to_string(), password.to_string()))
}
