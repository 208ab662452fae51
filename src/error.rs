//! Unified error handling for LabTrack.
//!
//! Every failure a workflow can surface to the operator maps to one of
//! these variants. Backend failures carry the server's own message
//! verbatim; validation failures are raised before any network call is
//! issued, and a failed mutation never leaves partially applied state
//! behind.

use crate::models::{Role, SampleStatus};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid credentials. Surfaced inline at the login prompt; the
    /// persisted session is left untouched.
    #[error("{0}")]
    Auth(String),

    /// A protected operation was attempted with no usable session.
    #[error("not logged in")]
    NotLoggedIn,

    /// A protected operation was attempted with the wrong role.
    #[error("this action requires the {required} role")]
    Forbidden { required: Role },

    /// The backend rejected the request. The message is the backend's own
    /// error text when it provided one.
    #[error("server error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Client-side validation failure. No request has been sent.
    #[error("{0}")]
    Validation(String),

    #[error("cannot move a {from} sample to {to}")]
    InvalidTransition {
        from: SampleStatus,
        to: SampleStatus,
    },

    #[error("session storage error: {0}")]
    SessionIo(#[from] std::io::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// Whether this is the backend's "no such resource" answer, e.g. a
    /// second delete of the same sample.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status: 404, .. })
    }
}
