// macdb-api: Async Rust client for the CouchDB HTTP API

pub mod couch;
pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod transport;

pub use couch::CouchClient;
pub use couch::models::{AllDocsRow, BulkResult, DocumentWritten, ServerInfo, Tombstone};
pub use error::Error;
pub use transport::{Credentials, TransportConfig};
