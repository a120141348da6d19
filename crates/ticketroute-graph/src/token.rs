//! Bearer access token.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// An already-acquired access token for Graph.
///
/// This crate never obtains or refreshes tokens; it only attaches them and
/// refuses to send a request with one that has expired.
#[derive(Clone)]
pub struct AccessToken {
    /// Raw bearer token.
    pub access_token: String,
    /// Expiration time, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token with unknown expiry.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sets the expiration relative to now.
    #[must_use]
    pub fn with_expires_in(self, seconds: i64) -> Self {
        self.with_expires_at(Utc::now() + Duration::seconds(seconds))
    }

    /// Checks if the token is expired (with 60 second buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(60) >= exp)
    }

    /// Returns true if the token is valid (not expired).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_without_expiry_is_valid() {
        let token = AccessToken::new("abc");
        assert!(token.is_valid());
    }

    #[test]
    fn test_token_expiration() {
        let expired = AccessToken::new("abc").with_expires_at(Utc::now() - Duration::seconds(120));
        assert!(expired.is_expired());

        // Inside the 60 second buffer counts as expired.
        let nearly = AccessToken::new("abc").with_expires_in(30);
        assert!(nearly.is_expired());

        let valid = AccessToken::new("abc").with_expires_in(3600);
        assert!(valid.is_valid());
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", AccessToken::new("super-secret"));
        assert!(!debug.contains("super-secret"));
    }
}
