// CouchDB API client modules
//
// Hand-written client for the subset of the CouchDB HTTP API macdb needs:
// server probe, database lifecycle, single-document CRUD, `_all_docs` and
// `_bulk_docs`. Endpoint groups are inherent impls split across files so
// `client` stays focused on transport mechanics.

pub mod client;
pub mod database;
pub mod documents;
pub mod models;

pub use client::CouchClient;
