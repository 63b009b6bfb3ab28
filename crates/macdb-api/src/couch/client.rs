// CouchDB HTTP client
//
// Wraps `reqwest::Client` with CouchDB URL construction, basic-auth
// injection, and status/error-body mapping. Endpoint groups (database,
// documents) are inherent methods in sibling files.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::couch::models::ErrorBody;
use crate::error::Error;
use crate::transport::{Credentials, TransportConfig};

/// Raw HTTP client for a CouchDB server.
///
/// Owns one `reqwest::Client` plus the server root URL. Every request is
/// sent with the configured basic-auth credentials; the base URL itself never
/// carries them.
pub struct CouchClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl CouchClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the server root, e.g. `http://couchdb:5984/`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            credentials: transport.credentials.clone(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            base_url,
            credentials,
        }
    }

    /// The server root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append percent-encoded path segments to the server root.
    ///
    /// Segments are pushed individually, so a `/` inside a document id is
    /// encoded as `%2F` the way CouchDB expects. `.` and `..` are dropped by
    /// URL normalisation whether encoded or not; see [`is_dot_segment`].
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::CannotBeABase(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        debug!("{} {}", method, url);
        let req = self.http.request(method, url);
        match self.credentials {
            Some(ref creds) => creds.apply(req),
            None => req,
        }
    }

    /// Send a request and decode a successful JSON body.
    ///
    /// `subject` names the database or document for error messages.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        subject: &str,
    ) -> Result<T, Error> {
        let resp = req.send().await.map_err(Error::Transport)?;
        let resp = Self::check_status(resp, subject).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Map a non-success response to a typed error using CouchDB's
    /// `{ "error": ..., "reason": ... }` body.
    pub(crate) async fn check_status(
        resp: reqwest::Response,
        subject: &str,
    ) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authentication {
                message: if body.reason.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.reason
                },
            },
            StatusCode::NOT_FOUND => Error::NotFound {
                subject: subject.to_owned(),
                reason: if body.reason.is_empty() {
                    format!("{subject} missing")
                } else {
                    body.reason
                },
            },
            StatusCode::CONFLICT => Error::Conflict {
                id: subject.to_owned(),
            },
            StatusCode::PRECONDITION_FAILED => Error::PreconditionFailed {
                reason: body.reason,
            },
            other => Error::Server {
                status: other.as_u16(),
                error: body.error,
                reason: body.reason,
            },
        })
    }
}

/// Ids that cannot be a URL path segment: `.`, `..` and their `%2E` forms
/// are removed by every WHATWG-conforming parser, so documents with these
/// ids are addressed through request bodies instead.
pub(crate) fn is_dot_segment(id: &str) -> bool {
    matches!(id, "." | "..")
}
