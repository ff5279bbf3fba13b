//! Error taxonomy for the session guard.
//!
//! Codec-level outcomes stay internal to the crate and are collapsed into
//! [`AuthError::Unauthorized`] at the guard boundary; the detailed cause is
//! logged, never surfaced, so callers cannot distinguish "expired" from
//! "tampered" from "store unreachable".

use thiserror::Error;

/// Outcome of signed-token verification. Only [`TokenError::Expired`]
/// permits falling into the refresh path; every variant reads as
/// "not authenticated".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token is missing required claim `{0}`")]
    MissingClaim(&'static str),

    #[error("token is malformed: {0}")]
    Malformed(String),
}

/// Failures surfaced by the login, logout and authenticate flows.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad username or bad password; never distinguished to the caller.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Store or codec failure while minting a token pair. No partial
    /// session state is left observable.
    #[error("failed to issue session tokens")]
    TokenIssuance(#[source] anyhow::Error),

    /// The guard's single externally visible rejection, covering missing
    /// sessions, invalid tokens, lockout and internal failures uniformly.
    #[error("unauthorized")]
    Unauthorized,

    /// Orchestration failure outside the issuance path (directory or store
    /// round trip). Detailed enough for the caller to log root cause.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
