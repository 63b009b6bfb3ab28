// CouchDB response types
//
// Only the fields macdb reads are modelled. Everything uses
// `#[serde(default)]` where CouchDB versions disagree on field presence.

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ── Server ───────────────────────────────────────────────────────────

/// Welcome document returned by `GET /`.
///
/// ```json
/// { "couchdb": "Welcome", "version": "3.3.3", "uuid": "..." }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub couchdb: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
}

// ── Errors ───────────────────────────────────────────────────────────

/// Error body attached to every non-2xx CouchDB response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub reason: String,
}

// ── Documents ────────────────────────────────────────────────────────

/// Acknowledgement for a document write or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentWritten {
    #[serde(default)]
    pub ok: bool,
    pub id: String,
    pub rev: String,
}

/// Generic acknowledgement for database-level operations (`{"ok": true}`).
#[derive(Debug, Deserialize)]
pub(crate) struct Ack {
    #[serde(default)]
    #[allow(dead_code)]
    pub ok: bool,
}

// ── _all_docs ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct AllDocsResponse {
    #[serde(default)]
    #[allow(dead_code)]
    pub total_rows: u64,
    pub rows: Vec<AllDocsRow>,
}

/// One row of `GET /{db}/_all_docs`.
///
/// `doc` is only present when the request asked for `include_docs=true`.
/// It stays untyped so design documents and other system entries don't
/// break decoding of the whole listing.
#[derive(Debug, Clone, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    pub key: String,
    pub value: RowValue,
    #[serde(default)]
    pub doc: Option<serde_json::Value>,
}

impl AllDocsRow {
    /// System documents (`_design/...`, `_local/...`) start with an underscore.
    pub fn is_system(&self) -> bool {
        self.id.starts_with('_')
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RowValue {
    pub rev: String,
}

/// Request body for `POST /{db}/_all_docs` restricted to given ids.
#[derive(Debug, Serialize)]
pub(crate) struct KeysRequest<'a> {
    pub keys: &'a [&'a str],
}

/// Row of a keyed `_all_docs` lookup. Unknown ids come back as
/// `{"key": ..., "error": "not_found"}`; deleted ones with a null `doc`.
#[derive(Debug, Deserialize)]
pub(crate) struct KeyedRow {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub doc: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeyedResponse {
    pub rows: Vec<KeyedRow>,
}

// ── _bulk_docs ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct BulkRequest<'a, T> {
    pub docs: &'a [T],
}

/// Per-document outcome from `POST /{db}/_bulk_docs`.
///
/// Successful entries carry `rev`; failed ones carry `error` and `reason`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkResult {
    pub id: String,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl BulkResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Fold a single-document bulk outcome into the error a direct
    /// `PUT`/`DELETE` on that document would have produced.
    pub fn into_written(self) -> Result<DocumentWritten, Error> {
        let reason = self.reason.unwrap_or_default();
        match (self.error, self.rev) {
            (None, Some(rev)) => Ok(DocumentWritten {
                ok: true,
                id: self.id,
                rev,
            }),
            (Some(error), _) if error == "conflict" => Err(Error::Conflict { id: self.id }),
            (Some(error), _) if error == "not_found" => Err(Error::NotFound {
                subject: self.id,
                reason,
            }),
            (error, _) => Err(Error::Rejected {
                id: self.id,
                error: error.unwrap_or_else(|| "missing_rev".into()),
                reason,
            }),
        }
    }
}

/// Tombstone submitted through `_bulk_docs` to delete a document.
#[derive(Debug, Clone, Serialize)]
pub struct Tombstone {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev")]
    pub rev: String,
    #[serde(rename = "_deleted")]
    pub deleted: bool,
}

impl Tombstone {
    pub fn new(id: impl Into<String>, rev: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rev: rev.into(),
            deleted: true,
        }
    }
}
