//! Explicit credential handling for the workbench service.
//!
//! The credential is an ordinary value passed into construction rather than
//! an implicit process-wide global. A missing token degrades the client
//! instead of aborting: unauthenticated calls fail downstream with an
//! auth-style remote error, and callers can surface the advisory text to
//! the user.

use std::env;

use thiserror::Error;

/// Environment variable consulted by [`Credential::from_env`].
pub const AUTH_TOKEN_ENV: &str = "SKIFF_AUTH_TOKEN";

/// URL where users can create an API token.
pub const TOKEN_CREATION_URL: &str = "https://api.skiff.cloud/readme-docs/login";

/// Bearer credential presented on authenticated requests.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Credential {
    token: Option<String>,
}

impl Credential {
    /// Wraps an explicit token value.
    pub fn new(token: impl Into<String>) -> Self {
        let trimmed = token.into().trim().to_owned();
        Self {
            token: (!trimmed.is_empty()).then_some(trimmed),
        }
    }

    /// Builds a credential with no token. Authenticated calls will fail
    /// downstream with an auth-style error.
    #[must_use]
    pub const fn absent() -> Self {
        Self { token: None }
    }

    /// Reads the token from `SKIFF_AUTH_TOKEN` in the process environment.
    ///
    /// Absence is not an error; check [`Credential::advisory`] to report it.
    #[must_use]
    pub fn from_env() -> Self {
        env::var(AUTH_TOKEN_ENV).map_or_else(|_| Self::absent(), Self::new)
    }

    /// Returns `true` when a token is available.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.token.is_some()
    }

    /// Returns the `Authorization` header value, when a token is available.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }

    /// Returns the advisory to show the user when no token is configured.
    #[must_use]
    pub const fn advisory(&self) -> Option<AuthenticationMissing> {
        if self.token.is_some() {
            None
        } else {
            Some(AuthenticationMissing)
        }
    }
}

/// Advisory raised when no credential token is configured.
///
/// This is deliberately non-fatal: construction proceeds and only
/// authenticated calls fail. The rendered message carries the guidance the
/// user needs to mint and export a token.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error(
    "{AUTH_TOKEN_ENV} not found in the environment.\n\
     Create a token at {TOKEN_CREATION_URL} and export it:\n\
     \x20\x20export {AUTH_TOKEN_ENV}=YOUR_TOKEN_HERE\n\
     Calls against the service will fail with authentication errors until a \
     token is configured."
)]
pub struct AuthenticationMissing;
