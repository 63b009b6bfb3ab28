// ── Core error types ──
//
// Domain errors from macdb-core. Consumers never see raw HTTP statuses or
// JSON parse failures directly; the `From<macdb_api::Error>` impl folds
// transport-layer errors into these variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to document store at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Document store request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Record not found: {key}")]
    NotFound { key: String },

    #[error("Collection '{name}' does not exist")]
    CollectionMissing { name: String },

    #[error("Concurrent update rejected for {key}")]
    Conflict { key: String },

    #[error("MAC address must not be empty")]
    EmptyKey,

    #[error("Line {line}: expected 4 comma-separated fields, found {fields}")]
    MalformedCsv { line: usize, fields: usize },

    #[error("Document {id} is not a MAC record: {message}")]
    MalformedDocument { id: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Invalid collection name '{name}': {reason}")]
    InvalidCollectionName { name: String, reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Store errors (wrapped, not exposed raw) ──────────────────────
    #[error("Document store error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<macdb_api::Error> for CoreError {
    fn from(err: macdb_api::Error) -> Self {
        match err {
            macdb_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            macdb_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() || e.is_request() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            macdb_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            macdb_api::Error::CannotBeABase(url) => CoreError::Config {
                message: format!("URL cannot be used as a server root: {url}"),
            },
            macdb_api::Error::ClientBuild(message) => CoreError::Config { message },
            macdb_api::Error::NotFound { subject, reason: _ } => {
                CoreError::NotFound { key: subject }
            }
            macdb_api::Error::Conflict { id } => CoreError::Conflict { key: id },
            macdb_api::Error::PreconditionFailed { reason } => CoreError::Api {
                message: reason,
                status: Some(412),
            },
            macdb_api::Error::Server {
                status,
                error,
                reason,
            } => CoreError::Api {
                message: format!("{error}: {reason}"),
                status: Some(status),
            },
            macdb_api::Error::Rejected { id, error, reason } => CoreError::Api {
                message: format!("{id}: {error}: {reason}"),
                status: None,
            },
            macdb_api::Error::Encode(e) => CoreError::Api {
                message: e.to_string(),
                status: None,
            },
            macdb_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Unexpected response body: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_key() {
        let err = CoreError::from(macdb_api::Error::Conflict { id: "AA:BB".into() });
        assert!(matches!(err, CoreError::Conflict { ref key } if key == "AA:BB"));
    }

    #[test]
    fn not_found_names_the_subject() {
        let err = CoreError::from(macdb_api::Error::NotFound {
            subject: "AA:BB".into(),
            reason: "deleted".into(),
        });
        assert!(matches!(err, CoreError::NotFound { ref key } if key == "AA:BB"));
    }

    #[test]
    fn server_error_keeps_status() {
        let err = CoreError::from(macdb_api::Error::Server {
            status: 503,
            error: "service_unavailable".into(),
            reason: "starting".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(503), .. }));
    }
}
