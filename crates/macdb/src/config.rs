//! Server settings: optional TOML file overlaid by `SERVER_*` environment
//! variables, then combined with CLI flags into a `StoreConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use macdb_core::{Backoff, RetryPolicy, StoreConfig};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::cli::{BackoffMode, GlobalOpts};
use crate::error::CliError;

/// Connection settings as read from file and environment.
///
/// ```toml
/// client_address = "couchdb.lan"
/// host_port = 5984
/// user = "admin"
/// password = "..."
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct ServerSettings {
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_address: Option<String>,
    pub host_port: Option<u16>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub password: Option<String>,
}

// Env values that look like numbers or booleans arrive typed; a password of
// `1234` is still a string here.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.map(|s| match s {
        Scalar::Text(s) => s,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
    }))
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "macdb", "macdb").map_or_else(
        || PathBuf::from(".macdb.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Merge the config file (if any) with `SERVER_*` variables. An explicitly
/// requested file must exist; the default one is optional.
pub fn load_settings(explicit: Option<&Path>) -> Result<(ServerSettings, PathBuf), CliError> {
    let path = match explicit {
        Some(path) if !path.is_file() => {
            return Err(CliError::NoConfig {
                path: path.display().to_string(),
            });
        }
        Some(path) => path.to_path_buf(),
        None => config_path(),
    };

    let settings = Figment::new()
        .merge(Toml::file(&path))
        .merge(Env::prefixed("SERVER_"))
        .extract()?;
    Ok((settings, path))
}

/// Build the store configuration from settings plus global flags.
pub fn store_config(global: &GlobalOpts) -> Result<StoreConfig, CliError> {
    let (settings, path) = load_settings(global.config.as_deref())?;
    resolve(settings, &path, global)
}

fn resolve(
    settings: ServerSettings,
    path: &Path,
    global: &GlobalOpts,
) -> Result<StoreConfig, CliError> {
    let missing = |env, key| CliError::MissingSetting {
        env,
        key,
        path: path.display().to_string(),
    };

    let address = settings
        .client_address
        .ok_or_else(|| missing("SERVER_CLIENT_ADDRESS", "client_address"))?;
    let port = settings
        .host_port
        .ok_or_else(|| missing("SERVER_HOST_PORT", "host_port"))?;
    let user = settings
        .user
        .ok_or_else(|| missing("SERVER_USER", "user"))?;
    let password = settings
        .password
        .map(SecretString::from)
        .ok_or_else(|| missing("SERVER_PASSWORD", "password"))?;

    Ok(StoreConfig::new(address, port, user, password)
        .with_collection(global.collection.clone())
        .with_timeout(Duration::from_secs(global.timeout))
        .with_retry(retry_policy(global)))
}

fn retry_policy(global: &GlobalOpts) -> RetryPolicy {
    RetryPolicy {
        delay: Duration::from_secs(global.retry_delay),
        max_attempts: global.max_retries.map(|n| n.saturating_add(1)),
        backoff: match global.backoff {
            BackoffMode::Fixed => Backoff::Fixed,
            BackoffMode::Exponential => Backoff::Exponential,
        },
        ..RetryPolicy::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use figment::Jail;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["macdb"];
        argv.extend_from_slice(args);
        argv.push("count");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn extract(file: &str) -> Result<ServerSettings, figment::Error> {
        Figment::new()
            .merge(Toml::string(file))
            .merge(Env::prefixed("SERVER_"))
            .extract()
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("SERVER_CLIENT_ADDRESS", "10.0.0.5");
            jail.set_env("SERVER_HOST_PORT", "6984");
            jail.set_env("SERVER_PASSWORD", "1234");
            let settings =
                extract("client_address = \"file-host\"\nhost_port = 5984\nuser = \"admin\"")?;
            assert_eq!(settings.client_address.as_deref(), Some("10.0.0.5"));
            assert_eq!(settings.host_port, Some(6984));
            assert_eq!(settings.user.as_deref(), Some("admin"));
            assert_eq!(settings.password.as_deref(), Some("1234"));
            Ok(())
        });
    }

    #[test]
    fn missing_setting_names_the_variable() {
        let settings = ServerSettings {
            client_address: Some("db".into()),
            host_port: Some(5984),
            user: None,
            password: Some("pw".into()),
        };
        let err = resolve(settings, Path::new("/etc/macdb.toml"), &global(&[])).unwrap_err();
        assert!(matches!(err, CliError::MissingSetting { env: "SERVER_USER", .. }));
    }

    #[test]
    fn flags_shape_the_store_config() {
        let settings = ServerSettings {
            client_address: Some("db".into()),
            host_port: Some(5984),
            user: Some("admin".into()),
            password: Some("pw".into()),
        };
        let opts = global(&[
            "--collection",
            "lab",
            "--max-retries",
            "2",
            "--retry-delay",
            "1",
            "--backoff",
            "exponential",
        ]);
        let config = resolve(settings, Path::new("unused"), &opts).unwrap();
        assert_eq!(config.collection, "lab");
        assert_eq!(config.password.expose_secret(), "pw");
        assert_eq!(config.retry.max_attempts, Some(3));
        assert_eq!(config.retry.delay, Duration::from_secs(1));
        assert_eq!(config.retry.backoff, Backoff::Exponential);
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let err = load_settings(Some(Path::new("/nonexistent/macdb.toml"))).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn explicit_config_file_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "user = \"from-file\"").unwrap();
        let (settings, path) = load_settings(Some(file.path())).unwrap();
        assert_eq!(path, file.path());
        // Env may or may not define SERVER_USER on the test host.
        assert!(settings.user.is_some());
    }
}
