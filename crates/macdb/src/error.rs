//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use macdb_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to CouchDB at {url}")]
    #[diagnostic(
        code(macdb::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Reason: {reason}\n\
             Retry longer with --max-retries, or omit it to wait forever."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(macdb::auth_failed),
        help("Verify SERVER_USER and SERVER_PASSWORD.")
    )]
    AuthFailed { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(macdb::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── Records ──────────────────────────────────────────────────────
    #[error("No MAC entry for '{mac}'")]
    #[diagnostic(code(macdb::not_found), help("Run: macdb list to see stored records"))]
    NotFound { mac: String },

    #[error("Collection '{name}' no longer exists")]
    #[diagnostic(
        code(macdb::collection_missing),
        help("It was dropped while this command ran. The next command recreates it.")
    )]
    CollectionMissing { name: String },

    #[error("'{mac}' was modified concurrently")]
    #[diagnostic(code(macdb::conflict), help("Re-run the command to apply it on top of the new revision."))]
    Conflict { mac: String },

    #[error("{path}, line {line}: expected 4 comma-separated fields, found {fields}")]
    #[diagnostic(
        code(macdb::malformed_csv),
        help(
            "Each line must read MAC,WE,code,info. Lines before this one were \
             already imported."
        )
    )]
    MalformedCsv {
        path: String,
        line: usize,
        fields: usize,
    },

    #[error("Document store error: {message}")]
    #[diagnostic(code(macdb::store))]
    Store { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("{env} is not set")]
    #[diagnostic(
        code(macdb::missing_setting),
        help(
            "Export {env}, or set `{key}` in the config file.\n\
             Config file: {path}"
        )
    )]
    MissingSetting {
        env: &'static str,
        key: &'static str,
        path: String,
    },

    #[error("Config file not found: {path}")]
    #[diagnostic(code(macdb::no_config))]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(macdb::config))]
    Config(Box<figment::Error>),

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(macdb::validation))]
    Validation { field: String, reason: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(macdb::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error("Cannot read {path}")]
    #[diagnostic(code(macdb::read_file))]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Cannot render output: {message}")]
    #[diagnostic(code(macdb::render))]
    Render { message: String },
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotFound { .. } | Self::CollectionMissing { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::MissingSetting { .. }
            | Self::NoConfig { .. }
            | Self::Config(_)
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout => CliError::Timeout,
            CoreError::NotFound { key } => CliError::NotFound { mac: key },
            CoreError::CollectionMissing { name } => CliError::CollectionMissing { name },
            CoreError::Conflict { key } => CliError::Conflict { mac: key },
            CoreError::EmptyKey => CliError::Validation {
                field: "MAC".into(),
                reason: "must not be empty".into(),
            },
            CoreError::MalformedCsv { line, fields } => CliError::MalformedCsv {
                path: "<input>".into(),
                line,
                fields,
            },
            CoreError::InvalidCollectionName { name, reason } => CliError::Validation {
                field: format!("collection '{name}'"),
                reason,
            },
            CoreError::Io(e) => CliError::Io(e),
            CoreError::Config { message } => CliError::Validation {
                field: "server".into(),
                reason: message,
            },
            CoreError::MalformedDocument { id, message } => CliError::Store {
                message: format!("{id}: {message}"),
            },
            CoreError::Api { message, status } => CliError::Store {
                message: match status {
                    Some(status) => format!("{message} (HTTP {status})"),
                    None => message,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let missing = CliError::MissingSetting {
            env: "SERVER_USER",
            key: "user",
            path: "/nowhere".into(),
        };
        assert_eq!(missing.exit_code(), exit_code::CONFIG);
        assert_eq!(
            CliError::from(CoreError::NotFound { key: "AA".into() }).exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::from(CoreError::ConnectionFailed {
                url: "http://db:5984/".into(),
                reason: "refused".into(),
            })
            .exit_code(),
            exit_code::CONNECTION
        );
    }

    #[test]
    fn missing_collection_is_not_reported_as_missing_record() {
        let err = CliError::from(CoreError::CollectionMissing { name: "macs".into() });
        assert_eq!(err.to_string(), "Collection 'macs' no longer exists");
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn store_errors_mention_http_status() {
        let err = CliError::from(CoreError::Api {
            message: "internal_server_error: boom".into(),
            status: Some(500),
        });
        assert_eq!(
            err.to_string(),
            "Document store error: internal_server_error: boom (HTTP 500)"
        );
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
