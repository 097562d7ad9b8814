use core::fmt;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Everything that can go wrong talking to the vendor API or interpreting its data.
#[derive(Debug)]
pub enum EvohomeError {
    /// The request never produced a response (DNS, connect, TLS, timeout, ...).
    Transport(String),
    /// The API answered with a non-success status.
    Http { status: u16, url: String, message: String },
    /// The payload did not match the expected shape.
    Decode { path: String, source: serde_json::Error },
    /// Login or re-authentication failed.
    Auth(String),
    /// The topology no longer has the shape the client relies on.
    InvariantViolation(String),
}

impl EvohomeError {
    /// Fatal errors end the operation that raised them; the rest are isolated per unit of
    /// work during refresh passes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EvohomeError::Auth(_) | EvohomeError::InvariantViolation(_))
    }

    pub(crate) fn decode(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        EvohomeError::Decode {
            path,
            source: err.into_inner(),
        }
    }
}

impl Display for EvohomeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EvohomeError::Transport(s) => write!(f, "transport error: {}", s),
            EvohomeError::Http { status, url, message } => write!(f, "http {} from {}: {}", status, url, message),
            EvohomeError::Decode { path, source } => write!(f, "decode error at `{}`: {}", path, source),
            EvohomeError::Auth(s) => write!(f, "auth error: {}", s),
            EvohomeError::InvariantViolation(s) => write!(f, "invariant violation: {}", s),
        }
    }
}

impl Error for EvohomeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EvohomeError::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ureq::Error> for EvohomeError {
    fn from(value: ureq::Error) -> Self {
        EvohomeError::Transport(value.to_string())
    }
}
