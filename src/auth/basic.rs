//! Basic credential parsing and comparison.

use base64::{engine::general_purpose::STANDARD, Engine};
use subtle::ConstantTimeEq;

use super::{split_header, AuthError};

/// Username and password presented with `Authorization: Basic ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Compare against the configured pair without short-circuiting.
    /// An unconfigured (empty) username or password never matches.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        if username.is_empty() || password.is_empty() {
            return false;
        }
        let user_ok = constant_time_compare(&self.username, username);
        let pass_ok = constant_time_compare(&self.password, password);
        user_ok & pass_ok
    }
}

/// Parse `<scheme> base64(username:password)`.
///
/// The scheme word is not checked, so clients sending `Bearer` with encoded
/// credentials are accepted too. The decoded value must contain exactly one
/// `:`; passwords containing a colon are rejected.
pub fn parse_basic_credentials(header: &str) -> Result<Credentials, AuthError> {
    let (_scheme, encoded) = split_header(header)?;

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| AuthError::InvalidBase64)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedCredentials)?;

    let parts: Vec<&str> = decoded.split(':').collect();
    match parts.as_slice() {
        [username, password] => Ok(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }),
        _ => Err(AuthError::MalformedCredentials),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
