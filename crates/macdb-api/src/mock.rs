//! In-memory CouchDB emulator for tests.
//!
//! [`MockCouch`] implements [`wiremock::Respond`] and answers the endpoints
//! [`CouchClient`](crate::CouchClient) uses, keeping databases and documents
//! in memory with real revision semantics: writes must carry the current
//! `_rev`, stale revisions get a 409, and deleted documents disappear from
//! `_all_docs`.
//!
//! ```no_run
//! # async fn demo() {
//! let (server, couch) = macdb_api::mock::MockCouch::start().await;
//! couch.create_database("macs");
//! println!("CouchDB emulator listening at {}", server.uri());
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

type Documents = BTreeMap<String, Value>;

#[derive(Debug, Default)]
struct State {
    databases: BTreeMap<String, Documents>,
    revisions: u64,
    unavailable_probes: u32,
    probes: u32,
    reject_auth: bool,
    failing_reads: bool,
    failing_writes: Vec<String>,
}

/// Shared handle to the emulator state. Clones observe the same data.
#[derive(Debug, Clone, Default)]
pub struct MockCouch {
    state: Arc<Mutex<State>>,
}

impl MockCouch {
    /// Start a `MockServer` with a fresh emulator mounted on every path.
    pub async fn start() -> (MockServer, Self) {
        let server = MockServer::start().await;
        let couch = Self::default();
        couch.mount(&server).await;
        (server, couch)
    }

    /// Mount this emulator on an existing server.
    pub async fn mount(&self, server: &MockServer) {
        Mock::given(any())
            .respond_with(self.clone())
            .mount(server)
            .await;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Fault injection ──────────────────────────────────────────────

    /// Answer the next `n` liveness probes (`GET /`) with 503.
    pub fn fail_probes(&self, n: u32) {
        self.lock().unavailable_probes = n;
    }

    /// Answer every request with 401 from now on.
    pub fn reject_credentials(&self) {
        self.lock().reject_auth = true;
    }

    /// Answer every single-document `GET` with 500 from now on.
    pub fn fail_document_reads(&self) {
        self.lock().failing_reads = true;
    }

    /// Answer every `PUT` or `DELETE` of document `id` with 500.
    pub fn fail_writes_to(&self, id: &str) {
        self.lock().failing_writes.push(id.to_owned());
    }

    // ── Seeding & inspection ─────────────────────────────────────────

    pub fn create_database(&self, db: &str) {
        self.lock().databases.entry(db.to_owned()).or_default();
    }

    pub fn has_database(&self, db: &str) -> bool {
        self.lock().databases.contains_key(db)
    }

    /// Insert a document directly, bypassing revision checks. Returns its `_rev`.
    pub fn insert(&self, db: &str, id: &str, mut doc: Value) -> String {
        let mut state = self.lock();
        let rev = state.next_rev(None);
        doc["_id"] = json!(id);
        doc["_rev"] = json!(rev);
        state
            .databases
            .entry(db.to_owned())
            .or_default()
            .insert(id.to_owned(), doc);
        rev
    }

    pub fn document(&self, db: &str, id: &str) -> Option<Value> {
        self.lock().databases.get(db).and_then(|docs| docs.get(id)).cloned()
    }

    pub fn document_count(&self, db: &str) -> usize {
        self.lock().databases.get(db).map_or(0, BTreeMap::len)
    }

    /// How many `GET /` probes the emulator has answered, failures included.
    pub fn probe_count(&self) -> u32 {
        self.lock().probes
    }
}

impl Respond for MockCouch {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.lock();
        if state.reject_auth {
            return error(401, "unauthorized", "Name or password is incorrect.");
        }

        let segments: Vec<String> = request
            .url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).map(percent_decode).collect())
            .unwrap_or_default();
        let query: BTreeMap<String, String> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let method = request.method.as_str();

        match segments.as_slice() {
            [] => state.probe(),
            [db] => state.database(method, db),
            [db, special] if special == "_all_docs" && method == "POST" => {
                state.keyed_docs(db, &request.body)
            }
            [db, special] if special == "_all_docs" => state.all_docs(db, &query),
            [db, special] if special == "_bulk_docs" && method == "POST" => {
                state.bulk_docs(db, &request.body)
            }
            [db, id] => state.document_op(method, db, id, &query, &request.body),
            _ => error(400, "bad_request", "unsupported path"),
        }
    }
}

impl State {
    fn next_rev(&mut self, previous: Option<&str>) -> String {
        self.revisions += 1;
        let generation = previous
            .and_then(|r| r.split('-').next())
            .and_then(|g| g.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        format!("{generation}-{:032x}", self.revisions)
    }

    fn probe(&mut self) -> ResponseTemplate {
        self.probes += 1;
        if self.unavailable_probes > 0 {
            self.unavailable_probes -= 1;
            return error(503, "service_unavailable", "node is starting");
        }
        ok(200, json!({ "couchdb": "Welcome", "version": "3.3.3" }))
    }

    fn database(&mut self, method: &str, db: &str) -> ResponseTemplate {
        let exists = self.databases.contains_key(db);
        match (method, exists) {
            ("HEAD", true) => ResponseTemplate::new(200),
            ("HEAD", false) => ResponseTemplate::new(404),
            ("GET", true) => {
                let count = self.databases.get(db).map_or(0, BTreeMap::len);
                ok(200, json!({ "db_name": db, "doc_count": count }))
            }
            ("PUT", false) => {
                self.databases.insert(db.to_owned(), Documents::new());
                ok(201, json!({ "ok": true }))
            }
            ("PUT", true) => error(
                412,
                "file_exists",
                "The database could not be created, the file already exists.",
            ),
            ("DELETE", true) => {
                self.databases.remove(db);
                ok(200, json!({ "ok": true }))
            }
            (_, false) => error(404, "not_found", "Database does not exist."),
            _ => error(405, "method_not_allowed", "Only DELETE,GET,HEAD,PUT allowed"),
        }
    }

    fn all_docs(&self, db: &str, query: &BTreeMap<String, String>) -> ResponseTemplate {
        let Some(docs) = self.databases.get(db) else {
            return error(404, "not_found", "Database does not exist.");
        };
        let include = query.get("include_docs").is_some_and(|v| v == "true");
        let rows: Vec<Value> = docs
            .iter()
            .map(|(id, doc)| {
                let mut row = json!({
                    "id": id,
                    "key": id,
                    "value": { "rev": doc["_rev"] },
                });
                if include {
                    row["doc"] = doc.clone();
                }
                row
            })
            .collect();
        ok(
            200,
            json!({ "total_rows": rows.len(), "offset": 0, "rows": rows }),
        )
    }

    fn keyed_docs(&self, db: &str, body: &[u8]) -> ResponseTemplate {
        let Some(docs) = self.databases.get(db) else {
            return error(404, "not_found", "Database does not exist.");
        };
        let keys = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(mut map)) => match map.remove("keys") {
                Some(Value::Array(keys)) => keys,
                _ => return error(400, "bad_request", "`keys` body member must be an array."),
            },
            _ => return error(400, "bad_request", "invalid UTF-8 JSON"),
        };
        let rows: Vec<Value> = keys
            .iter()
            .map(|key| match key.as_str().and_then(|k| docs.get(k)) {
                Some(doc) => json!({
                    "id": key,
                    "key": key,
                    "value": { "rev": doc["_rev"] },
                    "doc": doc,
                }),
                None => json!({ "key": key, "error": "not_found" }),
            })
            .collect();
        ok(
            200,
            json!({ "total_rows": docs.len(), "offset": 0, "rows": rows }),
        )
    }

    fn bulk_docs(&mut self, db: &str, body: &[u8]) -> ResponseTemplate {
        if !self.databases.contains_key(db) {
            return error(404, "not_found", "Database does not exist.");
        }
        let docs = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(mut map)) => match map.remove("docs") {
                Some(Value::Array(docs)) => docs,
                _ => return error(400, "bad_request", "POST body must include `docs` parameter."),
            },
            _ => return error(400, "bad_request", "invalid UTF-8 JSON"),
        };

        let results: Vec<Value> = docs
            .into_iter()
            .map(|doc| {
                let id = doc["_id"].as_str().unwrap_or_default().to_owned();
                match self.write(db, &id, doc) {
                    Ok(rev) => json!({ "ok": true, "id": id, "rev": rev }),
                    Err((_, err, reason)) => json!({ "id": id, "error": err, "reason": reason }),
                }
            })
            .collect();
        ok(201, Value::Array(results))
    }

    fn document_op(
        &mut self,
        method: &str,
        db: &str,
        id: &str,
        query: &BTreeMap<String, String>,
        body: &[u8],
    ) -> ResponseTemplate {
        if !self.databases.contains_key(db) {
            return error(404, "not_found", "Database does not exist.");
        }
        let failing = match method {
            "GET" => self.failing_reads,
            _ => self.failing_writes.iter().any(|w| w == id),
        };
        if failing {
            return error(500, "internal_server_error", "injected failure");
        }
        match method {
            "GET" => match self.databases.get(db).and_then(|d| d.get(id)) {
                Some(doc) => ok(200, doc.clone()),
                None => error(404, "not_found", "missing"),
            },
            "PUT" => {
                let Ok(doc) = serde_json::from_slice::<Value>(body) else {
                    return error(400, "bad_request", "invalid UTF-8 JSON");
                };
                match self.write(db, id, doc) {
                    Ok(rev) => ok(201, json!({ "ok": true, "id": id, "rev": rev })),
                    Err((status, err, reason)) => error(status, err, reason),
                }
            }
            "DELETE" => {
                let tombstone = json!({
                    "_id": id,
                    "_rev": query.get("rev").cloned().unwrap_or_default(),
                    "_deleted": true,
                });
                match self.write(db, id, tombstone) {
                    Ok(rev) => ok(200, json!({ "ok": true, "id": id, "rev": rev })),
                    Err((status, err, reason)) => error(status, err, reason),
                }
            }
            _ => error(405, "method_not_allowed", "Only DELETE,GET,HEAD,POST,PUT allowed"),
        }
    }

    /// Apply one document write with CouchDB's revision rules.
    fn write(
        &mut self,
        db: &str,
        id: &str,
        mut doc: Value,
    ) -> Result<String, (u16, &'static str, &'static str)> {
        const CONFLICT: (u16, &str, &str) = (409, "conflict", "Document update conflict.");

        if !doc.is_object() {
            return Err((400, "bad_request", "Document must be a JSON object"));
        }
        let current = self
            .databases
            .get(db)
            .and_then(|d| d.get(id))
            .and_then(|d| d["_rev"].as_str())
            .map(str::to_owned);
        let incoming = doc["_rev"].as_str().map(str::to_owned);
        let deleting = doc["_deleted"].as_bool().unwrap_or(false);

        if deleting {
            return match (current, incoming) {
                (Some(cur), Some(inc)) if cur == inc => {
                    let rev = self.next_rev(Some(&cur));
                    if let Some(docs) = self.databases.get_mut(db) {
                        docs.remove(id);
                    }
                    Ok(rev)
                }
                (None, _) => Err((404, "not_found", "missing")),
                _ => Err(CONFLICT),
            };
        }

        match (current.as_deref(), incoming.as_deref()) {
            (None, None) => {}
            (Some(cur), Some(inc)) if cur == inc => {}
            _ => return Err(CONFLICT),
        }

        let rev = self.next_rev(current.as_deref());
        doc["_id"] = json!(id);
        doc["_rev"] = json!(rev);
        self.databases
            .entry(db.to_owned())
            .or_default()
            .insert(id.to_owned(), doc);
        Ok(rev)
    }
}

fn ok(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(body)
}

fn error(status: u16, err: &str, reason: &str) -> ResponseTemplate {
    ok(status, json!({ "error": err, "reason": reason }))
}

/// Decode `%XX` escapes in a single path segment. `url` only exposes
/// form-urlencoded decoding, which would turn `+` into a space.
fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let decoded = match (bytes.get(i), bytes.get(i + 1..i + 3)) {
            (Some(b'%'), Some(hex)) => std::str::from_utf8(hex)
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok()),
            _ => None,
        };
        if let Some(b) = decoded {
            out.push(b);
            i += 3;
        } else {
            out.extend(bytes.get(i).copied());
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_escaped_slash() {
        assert_eq!(percent_decode("_design%2Fviews"), "_design/views");
        assert_eq!(percent_decode("AA:BB"), "AA:BB");
        assert_eq!(percent_decode("100%"), "100%");
    }

    #[test]
    fn stale_revision_conflicts() {
        let mut state = State::default();
        state.databases.insert("macs".into(), Documents::new());
        let first = state.write("macs", "AA", json!({ "info": "a" })).ok();
        assert!(first.is_some());
        let stale = state.write("macs", "AA", json!({ "info": "b" }));
        assert_eq!(stale.err().map(|e| e.0), Some(409));
        let fresh = state.write("macs", "AA", json!({ "info": "b", "_rev": first }));
        assert!(fresh.is_ok_and(|rev| rev.starts_with("2-")));
    }
}
