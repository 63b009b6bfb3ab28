// Document endpoints
//
// Single-document CRUD keyed by `_id`, plus `_all_docs` listing and
// `_bulk_docs` batch writes. Revision tokens are passed through untouched.
//
// Ids `.` and `..` cannot travel in a path, so those documents are read with
// a keyed `POST _all_docs` and written through `_bulk_docs`.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::couch::client::{CouchClient, is_dot_segment};
use crate::couch::models::{
    AllDocsResponse, AllDocsRow, BulkRequest, BulkResult, DocumentWritten, KeyedResponse,
    KeysRequest, Tombstone,
};
use crate::error::Error;

impl CouchClient {
    /// Fetch one document by id.
    ///
    /// `GET /{db}/{id}` -- returns `Ok(None)` on 404.
    pub async fn get_document<T: DeserializeOwned>(
        &self,
        db: &str,
        id: &str,
    ) -> Result<Option<T>, Error> {
        if is_dot_segment(id) {
            return self.get_document_by_key(db, id).await;
        }
        let url = self.url(&[db, id])?;
        let resp = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(Error::Transport)?;

        if resp.status() == StatusCode::NOT_FOUND {
            debug!(db, id, "document not found");
            return Ok(None);
        }

        let resp = Self::check_status(resp, id).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })
    }

    /// Create or replace a document.
    ///
    /// `PUT /{db}/{id}` -- the body must carry the current `_rev` when
    /// replacing, otherwise CouchDB answers 409 (`Error::Conflict`).
    pub async fn put_document<T: Serialize + ?Sized>(
        &self,
        db: &str,
        id: &str,
        doc: &T,
    ) -> Result<DocumentWritten, Error> {
        if is_dot_segment(id) {
            let mut body = serde_json::to_value(doc).map_err(Error::Encode)?;
            if let Some(map) = body.as_object_mut() {
                map.insert("_id".into(), id.into());
            }
            return self.write_one(db, id, &body).await;
        }
        let url = self.url(&[db, id])?;
        self.send_json(self.request(Method::PUT, url).json(doc), id)
            .await
    }

    /// Delete a document at a specific revision.
    ///
    /// `DELETE /{db}/{id}?rev={rev}`
    pub async fn delete_document(
        &self,
        db: &str,
        id: &str,
        rev: &str,
    ) -> Result<DocumentWritten, Error> {
        if is_dot_segment(id) {
            return self.write_one(db, id, &Tombstone::new(id, rev)).await;
        }
        let mut url = self.url(&[db, id])?;
        url.query_pairs_mut().append_pair("rev", rev);
        self.send_json(self.request(Method::DELETE, url), id).await
    }

    /// List every document id and revision in a database.
    ///
    /// `GET /{db}/_all_docs[?include_docs=true]`. Rows come back in
    /// CouchDB's id collation order, system documents included.
    pub async fn all_docs(&self, db: &str, include_docs: bool) -> Result<Vec<AllDocsRow>, Error> {
        let mut url = self.url(&[db, "_all_docs"])?;
        if include_docs {
            url.query_pairs_mut().append_pair("include_docs", "true");
        }
        let resp: AllDocsResponse = self.send_json(self.request(Method::GET, url), db).await?;
        Ok(resp.rows)
    }

    /// Write many documents in one request.
    ///
    /// `POST /{db}/_bulk_docs` with `{"docs": [...]}`. The request as a whole
    /// succeeds even when individual documents are rejected, so callers
    /// must inspect each `BulkResult`.
    pub async fn bulk_docs<T: Serialize>(
        &self,
        db: &str,
        docs: &[T],
    ) -> Result<Vec<BulkResult>, Error> {
        let url = self.url(&[db, "_bulk_docs"])?;
        debug!(db, count = docs.len(), "bulk write");
        self.send_json(
            self.request(Method::POST, url).json(&BulkRequest { docs }),
            db,
        )
        .await
    }

    // ── Body-addressed fallbacks ─────────────────────────────────────

    /// `POST /{db}/_all_docs?include_docs=true` with `{"keys": [id]}`.
    async fn get_document_by_key<T: DeserializeOwned>(
        &self,
        db: &str,
        id: &str,
    ) -> Result<Option<T>, Error> {
        let mut url = self.url(&[db, "_all_docs"])?;
        url.query_pairs_mut().append_pair("include_docs", "true");
        let req = self
            .request(Method::POST, url)
            .json(&KeysRequest { keys: &[id] });
        let resp: KeyedResponse = self.send_json(req, db).await?;

        let Some(doc) = resp
            .rows
            .into_iter()
            .find(|row| row.error.is_none())
            .and_then(|row| row.doc)
        else {
            debug!(db, id, "document not found");
            return Ok(None);
        };
        serde_json::from_value(doc.clone())
            .map(Some)
            .map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: doc.to_string(),
            })
    }

    async fn write_one<T: Serialize>(
        &self,
        db: &str,
        id: &str,
        doc: &T,
    ) -> Result<DocumentWritten, Error> {
        let results = self.bulk_docs(db, std::slice::from_ref(doc)).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| Error::Rejected {
                id: id.to_owned(),
                error: "empty_response".into(),
                reason: "_bulk_docs returned no result".into(),
            })?
            .into_written()
    }
}
