// ── MAC record ──

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::codes::{ConnectionType, DeviceCode};

/// One device identity as stored in the collection.
///
/// `id` and `mac` always hold the same uppercased address: `id` is the
/// document key, `mac` the searchable field. `rev` and `extra` belong to the
/// store and are carried through updates untouched.
///
/// Wire shape:
/// ```json
/// { "_id": "B8:27:EB:00:11:22", "_rev": "3-...", "MAC": "B8:27:EB:00:11:22",
///   "WE": "W", "code": "RPi", "info": "garage sensor" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(rename = "MAC")]
    pub mac: String,
    #[serde(rename = "WE")]
    pub connection_type: String,
    #[serde(rename = "code")]
    pub device_code: String,
    pub info: String,
    /// Any other fields found on the stored document.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MacRecord {
    /// Build a fresh record. The address is uppercased into both key and
    /// `MAC`; the other fields are stored verbatim.
    pub fn new(
        mac: &str,
        connection_type: impl Into<String>,
        device_code: impl Into<String>,
        info: impl Into<String>,
    ) -> Self {
        let mac = mac.to_uppercase();
        Self {
            id: mac.clone(),
            rev: None,
            mac,
            connection_type: connection_type.into(),
            device_code: device_code.into(),
            info: info.into(),
            extra: Map::new(),
        }
    }

    /// Overwrite the four logical fields with `source`'s, keeping this
    /// record's `_id`, `_rev` and extra fields.
    pub fn merge_from(&mut self, source: &MacRecord) {
        self.mac = source.mac.to_uppercase();
        self.connection_type.clone_from(&source.connection_type);
        self.device_code.clone_from(&source.device_code);
        self.info.clone_from(&source.info);
    }

    /// Compare the four logical fields, ignoring store metadata.
    pub fn same_fields(&self, other: &MacRecord) -> bool {
        self.mac == other.mac
            && self.connection_type == other.connection_type
            && self.device_code == other.device_code
            && self.info == other.info
    }

    /// Classify the `WE` field, `None` when it is not `W` or `E`.
    pub fn connection_kind(&self) -> Option<ConnectionType> {
        self.connection_type.parse().ok()
    }

    /// Classify the `code` field, `None` for codes outside the known set.
    pub fn device_class(&self) -> Option<DeviceCode> {
        self.device_code.parse().ok()
    }
}

/// Diagnostic rendering with a fixed key order. Not used on the wire.
impl fmt::Display for MacRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ \"_id\": {}, \"MAC\": {}, \"WE\": {}, \"code\": {}, \"info\": {} }}",
            quoted(&self.id),
            quoted(&self.mac),
            quoted(&self.connection_type),
            quoted(&self.device_code),
            quoted(&self.info),
        )
    }
}

fn quoted(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn new_uppercases_key_and_address() {
        let rec = MacRecord::new("b8:27:eb:0a:bc:de", "W", "RPi", "lab pi");
        assert_eq!(rec.id, "B8:27:EB:0A:BC:DE");
        assert_eq!(rec.mac, rec.id);
        assert!(rec.rev.is_none());
    }

    #[test]
    fn new_keeps_other_fields_verbatim() {
        let rec = MacRecord::new("aa", "x", "weird", "  Mixed Case  ");
        assert_eq!(rec.connection_type, "x");
        assert_eq!(rec.device_code, "weird");
        assert_eq!(rec.info, "  Mixed Case  ");
        assert!(rec.connection_kind().is_none());
        assert!(rec.device_class().is_none());
    }

    #[test]
    fn merge_preserves_revision_and_extra_fields() {
        let mut stored: MacRecord = serde_json::from_value(json!({
            "_id": "AA:BB",
            "_rev": "7-deadbeef",
            "MAC": "AA:BB",
            "WE": "E",
            "code": "OTH",
            "info": "old",
            "location": "rack 2"
        }))
        .unwrap();

        let mut incoming = MacRecord::new("aa:bb", "W", "APL", "new");
        incoming.mac = "aa:bb".into();
        stored.merge_from(&incoming);

        assert_eq!(stored.rev.as_deref(), Some("7-deadbeef"));
        assert_eq!(stored.id, "AA:BB");
        assert_eq!(stored.mac, "AA:BB");
        assert_eq!(stored.info, "new");
        assert_eq!(stored.extra.get("location"), Some(&json!("rack 2")));
    }

    #[test]
    fn fresh_record_serializes_without_rev() {
        let value = serde_json::to_value(MacRecord::new("aa", "E", "OTH", "foo")).unwrap();
        assert_eq!(
            value,
            json!({ "_id": "AA", "MAC": "AA", "WE": "E", "code": "OTH", "info": "foo" })
        );
    }

    #[test]
    fn display_has_fixed_key_order() {
        let rec = MacRecord::new("00:00:00:00:00:00", "E", "OTH", "say \"hi\"");
        assert_eq!(
            rec.to_string(),
            r#"{ "_id": "00:00:00:00:00:00", "MAC": "00:00:00:00:00:00", "WE": "E", "code": "OTH", "info": "say \"hi\"" }"#
        );
    }
}
