//! Access-token state for the vendor API.
//!
//! A [`Session`] starts out unauthenticated and becomes authenticated once a login hands it
//! a [`TokenPair`]. Tokens are valid for a fixed lifetime from the moment they were issued;
//! there is no refresh-token exchange, so a stale session is renewed by logging in again.

use chrono::{DateTime, Duration, Utc};

/// Lifetime in seconds assumed when the token response does not state one.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 1800;

#[derive(Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: DateTime<Utc>,
    pub lifetime: Duration,
}

impl TokenPair {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + self.lifetime
    }
}

impl core::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(TokenPair),
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn authenticated(tokens: TokenPair) -> Self {
        Session {
            state: SessionState::Authenticated(tokens),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// Replace whatever tokens were held with a freshly issued pair.
    pub fn authenticate(&mut self, tokens: TokenPair) {
        self.state = SessionState::Authenticated(tokens);
    }

    /// Drop the held tokens; the next call must log in first.
    pub fn invalidate(&mut self) {
        self.state = SessionState::Unauthenticated;
    }

    pub fn access_token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated(t) => Some(t.access_token.as_str()),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            SessionState::Authenticated(t) => Some(t.expires_at()),
            SessionState::Unauthenticated => None,
        }
    }

    /// True when a login is needed before the next call: no tokens yet, or `now` is at or
    /// past the expiry instant.
    pub fn requires_reauthentication(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires_at) => now >= expires_at,
            None => true,
        }
    }
}
