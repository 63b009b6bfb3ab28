// ── MAC record store ──
//
// One collection of `MacRecord`s keyed by uppercased MAC address. Every key
// passed in is uppercased before it reaches the server, so lookups are
// case-insensitive from the caller's side.

use macdb_api::{CouchClient, Credentials, Tombstone, TransportConfig};
use tracing::{debug, info, warn};

use crate::config::{StoreConfig, validate_collection_name};
use crate::error::CoreError;
use crate::model::MacRecord;
use crate::retry::RetryPolicy;

/// Result of [`MacStore::get`].
#[derive(Debug)]
pub enum Lookup {
    Found(MacRecord),
    NotFound,
    /// The store call failed; the record may or may not exist.
    Transient(CoreError),
}

impl Lookup {
    /// Interactive policy: log a failed lookup and treat it as absent.
    pub fn into_found(self) -> Option<MacRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound => None,
            Self::Transient(e) => {
                warn!(error = %e, "lookup failed, treating record as absent");
                None
            }
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Result of [`MacStore::delete`].
#[derive(Debug)]
pub enum Removal {
    Deleted,
    NotFound,
    Transient(CoreError),
}

impl Removal {
    /// Strict policy: `Ok(true)` if a record was removed, `Ok(false)` if
    /// there was none, `Err` if the store call failed.
    pub fn into_result(self) -> Result<bool, CoreError> {
        match self {
            Self::Deleted => Ok(true),
            Self::NotFound => Ok(false),
            Self::Transient(e) => Err(e),
        }
    }
}

/// What [`MacStore::put`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    Updated,
}

/// Client for one collection of MAC records.
///
/// Only obtainable in the ready state: [`connect`](Self::connect) returns
/// once the server answered and the collection exists.
/// [`terminate`](Self::terminate) consumes the store, so nothing can use it
/// afterwards.
pub struct MacStore {
    client: CouchClient,
    collection: String,
}

impl MacStore {
    /// Connect to the server, waiting per `config.retry` while it is
    /// unreachable, then open the collection, creating it if needed.
    ///
    /// Rejected credentials and invalid collection names fail immediately.
    pub async fn connect(config: &StoreConfig) -> Result<Self, CoreError> {
        validate_collection_name(&config.collection)?;
        let url = config.server_url()?;
        let transport = TransportConfig::default()
            .with_timeout(config.timeout)
            .with_credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ));
        let client = CouchClient::new(url, &transport)?;

        wait_until_up(&client, &config.retry).await?;
        Self::open(client, &config.collection).await
    }

    /// Open or create `collection` on an already reachable server.
    pub async fn open(client: CouchClient, collection: &str) -> Result<Self, CoreError> {
        validate_collection_name(collection)?;
        debug!(collection, "opening collection");

        if !client.database_exists(collection).await? {
            match client.create_database(collection).await {
                Ok(()) => info!(collection, "created collection"),
                // Someone else created it between the check and the create.
                Err(macdb_api::Error::PreconditionFailed { .. }) => {
                    debug!(collection, "collection appeared concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(collection, state = "ready", "collection open");
        Ok(Self {
            client,
            collection: collection.to_owned(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    // ── Single-record operations ─────────────────────────────────────

    /// Fetch the record stored under `key` (case-insensitive).
    pub async fn get(&self, key: &str) -> Lookup {
        let key = key.to_uppercase();
        if key.is_empty() {
            return Lookup::NotFound;
        }

        match self
            .client
            .get_document::<MacRecord>(&self.collection, &key)
            .await
        {
            Ok(Some(record)) => {
                debug!(key = %key, %record, "get: found");
                Lookup::Found(record)
            }
            Ok(None) => {
                debug!(key = %key, "get: not found");
                Lookup::NotFound
            }
            Err(e) => Lookup::Transient(e.into()),
        }
    }

    /// Insert `record`, or merge it into the record already stored under
    /// `key`, keeping that document's revision.
    ///
    /// A failed existence check is logged and the write is still attempted
    /// as an insert. Write failures, including revision conflicts from a
    /// concurrent writer, are returned as-is and never retried.
    pub async fn put(&self, key: &str, record: &MacRecord) -> Result<PutOutcome, CoreError> {
        let key = key.to_uppercase();
        if key.is_empty() {
            return Err(CoreError::EmptyKey);
        }
        debug!(key = %key, %record, "put");

        match self.get(&key).await {
            Lookup::Found(mut existing) => {
                existing.merge_from(record);
                self.client
                    .put_document(&self.collection, &key, &existing)
                    .await
                    .map_err(|e| self.collection_error(e))?;
                debug!(key = %key, record = %existing, "put: updated");
                Ok(PutOutcome::Updated)
            }
            Lookup::NotFound => self.insert(record).await,
            Lookup::Transient(e) => {
                warn!(key = %key, error = %e, "existence check failed, attempting insert");
                self.insert(record).await
            }
        }
    }

    async fn insert(&self, record: &MacRecord) -> Result<PutOutcome, CoreError> {
        if record.id.is_empty() {
            return Err(CoreError::EmptyKey);
        }
        let mut fresh = record.clone();
        fresh.rev = None;
        self.client
            .put_document(&self.collection, &fresh.id, &fresh)
            .await
            .map_err(|e| self.collection_error(e))?;
        debug!(key = %fresh.id, "put: inserted");
        Ok(PutOutcome::Inserted)
    }

    /// Remove the record stored under `key` (case-insensitive).
    pub async fn delete(&self, key: &str) -> Removal {
        let key = key.to_uppercase();
        let existing = match self.get(&key).await {
            Lookup::Found(record) => record,
            Lookup::NotFound => return Removal::NotFound,
            Lookup::Transient(e) => return Removal::Transient(e),
        };
        let Some(rev) = existing.rev.as_deref() else {
            return Removal::Transient(CoreError::MalformedDocument {
                id: key,
                message: "stored document has no _rev".into(),
            });
        };

        match self
            .client
            .delete_document(&self.collection, &key, rev)
            .await
        {
            Ok(_) => {
                debug!(key = %key, "delete: removed");
                Removal::Deleted
            }
            Err(e) if e.is_not_found() => Removal::NotFound,
            Err(e) => Removal::Transient(e.into()),
        }
    }

    // ── Whole-collection operations ──────────────────────────────────

    /// Every MAC record, sorted by address.
    ///
    /// System documents (ids starting with `_`) are skipped, and so is any
    /// document missing one of the record fields.
    pub async fn list_all(&self) -> Result<Vec<MacRecord>, CoreError> {
        let rows = self
            .client
            .all_docs(&self.collection, true)
            .await
            .map_err(|e| self.collection_error(e))?;
        let mut records: Vec<MacRecord> = rows
            .into_iter()
            .filter(|row| !row.is_system())
            .filter_map(|row| {
                let doc = row.doc?;
                match serde_json::from_value::<MacRecord>(doc) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(id = %row.id, error = %e, "skipping document that is not a MAC record");
                        None
                    }
                }
            })
            .collect();
        records.sort_by(|a, b| a.mac.cmp(&b.mac));
        Ok(records)
    }

    /// Number of records [`list_all`](Self::list_all) would return.
    pub async fn size(&self) -> Result<usize, CoreError> {
        Ok(self.list_all().await?.len())
    }

    /// Delete every non-system document in one `_bulk_docs` request.
    ///
    /// Returns how many documents the server actually deleted; individual
    /// rejections are logged.
    pub async fn clean(&self) -> Result<usize, CoreError> {
        let rows = self
            .client
            .all_docs(&self.collection, false)
            .await
            .map_err(|e| self.collection_error(e))?;
        let tombstones: Vec<Tombstone> = rows
            .into_iter()
            .filter(|row| !row.is_system())
            .map(|row| Tombstone::new(row.id, row.value.rev))
            .collect();

        if tombstones.is_empty() {
            debug!(collection = %self.collection, "clean: nothing to delete");
            return Ok(0);
        }

        let results = self
            .client
            .bulk_docs(&self.collection, &tombstones)
            .await
            .map_err(|e| self.collection_error(e))?;
        let mut removed = 0;
        for result in &results {
            if result.is_ok() {
                removed += 1;
            } else {
                warn!(
                    id = %result.id,
                    error = ?result.error,
                    reason = ?result.reason,
                    "bulk delete rejected"
                );
            }
        }
        info!(collection = %self.collection, removed, "collection cleaned");
        Ok(removed)
    }

    /// Clean the collection, then drop it from the server.
    pub async fn terminate(self) -> Result<(), CoreError> {
        self.clean().await?;
        self.client
            .delete_database(&self.collection)
            .await
            .map_err(|e| self.collection_error(e))?;
        info!(collection = %self.collection, state = "terminated", "collection dropped");
        Ok(())
    }

    // Writes and listings only 404 when the database itself is gone.
    fn collection_error(&self, err: macdb_api::Error) -> CoreError {
        if err.is_not_found() {
            CoreError::CollectionMissing {
                name: self.collection.clone(),
            }
        } else {
            err.into()
        }
    }
}

/// Probe the server root until it answers, sleeping per `policy` between
/// transient failures.
async fn wait_until_up(client: &CouchClient, policy: &RetryPolicy) -> Result<(), CoreError> {
    let mut failures: u32 = 0;
    loop {
        info!(
            url = %client.base_url(),
            attempt = failures.saturating_add(1),
            state = "connecting",
            "connecting to document store"
        );
        match client.server_info().await {
            Ok(server) => {
                info!(version = ?server.version, "document store reachable");
                return Ok(());
            }
            Err(e) if e.is_transient() => {
                failures = failures.saturating_add(1);
                if !policy.allows_another(failures) {
                    return Err(CoreError::ConnectionFailed {
                        url: client.base_url().to_string(),
                        reason: e.to_string(),
                    });
                }
                let delay = policy.delay_for(failures - 1);
                info!(
                    error = %e,
                    delay_secs = delay.as_secs_f64(),
                    "document store not reachable, will retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
