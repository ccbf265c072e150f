//! Authentication material for the iControl REST API.

use secrecy::SecretString;

/// Username/password pair for the management interface.
///
/// The password lives in a [`SecretString`] so it never shows up in debug
/// output or log lines.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<SecretString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// How requests authenticate against the device.
///
/// Token auth performs a login against `/mgmt/shared/authn/login` and sends
/// the issued token in the `X-F5-Auth-Token` header; basic auth signs every
/// request directly. Remote-auth (TACACS/RADIUS) users must use tokens, so
/// token is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScheme {
    #[default]
    Token,
    Basic,
}
