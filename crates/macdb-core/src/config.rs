// ── Runtime connection configuration ──
//
// Describes *how* to reach the document store. Carries credential data and
// connection tuning but never touches disk or the environment; the CLI
// builds a `StoreConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::retry::RetryPolicy;

/// Collection holding the MAC records unless overridden.
pub const DEFAULT_COLLECTION: &str = "macs";

/// Everything `MacStore::connect` needs.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Hostname or IP clients use to reach the server.
    pub address: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    /// Collection (CouchDB database) name. See [`validate_collection_name`].
    pub collection: String,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// How to wait for the server at startup.
    pub retry: RetryPolicy,
}

impl StoreConfig {
    pub fn new(
        address: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            address: address.into(),
            port,
            user: user.into(),
            password,
            collection: DEFAULT_COLLECTION.into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Server root URL, `http://{address}:{port}/`. Bare IPv6 literals are
    /// bracketed.
    pub fn server_url(&self) -> Result<Url, CoreError> {
        let host = if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]", self.address)
        } else {
            self.address.clone()
        };
        Url::parse(&format!("http://{host}:{}/", self.port)).map_err(|e| CoreError::Config {
            message: format!("invalid server address '{}': {e}", self.address),
        })
    }
}

/// CouchDB database naming rules: a lowercase letter first, then lowercase
/// letters, digits and `_ $ ( ) + - /`.
pub fn validate_collection_name(name: &str) -> Result<(), CoreError> {
    let invalid = |reason: &str| CoreError::InvalidCollectionName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };

    let mut chars = name.chars();
    match chars.next() {
        None => return Err(invalid("name is empty")),
        Some(c) if !c.is_ascii_lowercase() => {
            return Err(invalid("must begin with a lowercase letter"));
        }
        Some(_) => {}
    }
    if let Some(bad) = chars.find(|c| {
        !(c.is_ascii_lowercase() || c.is_ascii_digit() || "_$()+-/".contains(*c))
    }) {
        return Err(invalid(&format!("character '{bad}' is not allowed")));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(address: &str) -> StoreConfig {
        StoreConfig::new(address, 5984, "admin", SecretString::from("pw".to_string()))
    }

    #[test]
    fn server_url_from_hostname() {
        let url = config("couchdb").server_url().unwrap();
        assert_eq!(url.as_str(), "http://couchdb:5984/");
    }

    #[test]
    fn server_url_brackets_ipv6() {
        let url = config("::1").server_url().unwrap();
        assert_eq!(url.as_str(), "http://[::1]:5984/");
    }

    #[test]
    fn server_url_never_embeds_credentials() {
        let url = config("10.0.0.5").server_url().unwrap();
        assert_eq!(url.username(), "");
        assert!(url.password().is_none());
    }

    #[test]
    fn collection_names() {
        assert!(validate_collection_name("macs").is_ok());
        assert!(validate_collection_name("test-db").is_ok());
        assert!(validate_collection_name("a$(b)+c/d_1").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("Macs").is_err());
        assert!(validate_collection_name("1macs").is_err());
        assert!(validate_collection_name("_users").is_err());
        assert!(validate_collection_name("mac s").is_err());
    }
}
