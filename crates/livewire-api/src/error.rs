use thiserror::Error;

/// Errors surfaced by the API gateway and the typed wrappers on top of it.
///
/// Only the single expired-credential case is recovered internally; every
/// other failure passes through to the caller untouched.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Terminal HTTP 401 — either no recovery was possible (no refresh
    /// credential stored) or the replayed request was rejected again.
    #[error("unauthenticated (HTTP 401): {body}")]
    Unauthenticated { body: String },

    /// The refresh exchange itself failed. Carries the exchange failure,
    /// not the 401 that triggered it; both credential slots have been
    /// cleared and a [`SessionEvent::Expired`] was emitted.
    ///
    /// [`SessionEvent::Expired`]: crate::gateway::SessionEvent::Expired
    #[error("session expired, log in again")]
    SessionExpired(#[source] Box<ApiError>),

    /// Any other non-success status, passed through unchanged.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error")]
    Transport(#[from] reqwest::Error),

    #[error("failed to encode request body")]
    Encode(#[from] serde_json::Error),

    #[error("session store error")]
    Session(#[source] anyhow::Error),
}

impl ApiError {
    /// The HTTP status behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthenticated { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::SessionExpired(source) => source.status(),
            _ => None,
        }
    }
}
