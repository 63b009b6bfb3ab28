use thiserror::Error;

/// Top-level error type for the `macdb-api` crate.
///
/// Covers every failure mode of the CouchDB HTTP surface: transport,
/// authentication, the `{error, reason}` body CouchDB returns on failure,
/// and decoding. `macdb-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Server rejected the basic-auth credentials (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL cannot carry path segments (e.g. `mailto:`).
    #[error("URL cannot be used as a base: {0}")]
    CannotBeABase(String),

    /// Building the underlying HTTP client failed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Server responses ────────────────────────────────────────────
    /// Database or document does not exist (HTTP 404). `subject` is the
    /// database or document the request addressed.
    #[error("Not found: {subject} ({reason})")]
    NotFound { subject: String, reason: String },

    /// Revision conflict on write (HTTP 409).
    #[error("Document update conflict on '{id}'")]
    Conflict { id: String },

    /// Precondition failed, e.g. creating a database that exists (HTTP 412).
    #[error("Precondition failed: {reason}")]
    PreconditionFailed { reason: String },

    /// A `_bulk_docs` entry was refused for a reason other than a conflict
    /// or a missing document.
    #[error("Write of '{id}' rejected: {error}: {reason}")]
    Rejected {
        id: String,
        error: String,
        reason: String,
    },

    /// Any other non-success status, with CouchDB's `{error, reason}` body.
    #[error("CouchDB error (HTTP {status}) {error}: {reason}")]
    Server {
        status: u16,
        error: String,
        reason: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// A request body could not be encoded as JSON.
    #[error("Cannot encode request body: {0}")]
    Encode(serde_json::Error),

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if the server refused the write because of a stale `_rev`.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
