//! MAC address inventory on top of a CouchDB collection.
//!
//! - **[`MacRecord`]** - one device identity (address, connection type,
//!   device-class code, free text) plus the store's opaque revision metadata.
//!   Construction uppercases the address into both the key and the `MAC`
//!   field; [`MacRecord::merge_from`] updates the four logical fields while
//!   leaving `_rev` untouched.
//!
//! - **[`MacStore`]** - owns the HTTP client and collection name.
//!   [`connect()`](MacStore::connect) blocks until the server answers (per a
//!   [`RetryPolicy`]), opens or creates the collection, and returns a ready
//!   client. Lookups return [`Lookup`] / [`Removal`] so callers choose
//!   whether a transient failure counts as "absent".
//!
//! - **[`csv`]** - the naive `MAC,WE,code,info` line format used for bulk
//!   import and export.

pub mod config;
pub mod csv;
pub mod error;
pub mod model;
pub mod retry;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_COLLECTION, StoreConfig, validate_collection_name};
pub use error::CoreError;
pub use model::{ConnectionType, DeviceCode, MacRecord};
pub use retry::{Backoff, RetryPolicy};
pub use store::{Lookup, MacStore, PutOutcome, Removal};
