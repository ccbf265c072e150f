//! Profile configuration for bigsync.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `bigsync_api::Connection`. The CLI layers flag overrides
//! on top; everything ambient lives here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bigsync_api::{AuthScheme, Connection, Credentials};

/// Keyring service name under which passwords are stored.
const KEYRING_SERVICE: &str = "bigsync";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{profile}' in {path}")]
    UnknownProfile { profile: String, path: PathBuf },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring access failed: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is absent.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The profile a run should use: explicit name, else the configured
    /// default, else `"default"`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.to_owned(),
                path: config_path(),
            })?;
        Ok((name, profile))
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Concurrent device operations per kind.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Seconds between passes in watch mode.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            jobs: default_jobs(),
            interval: default_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_jobs() -> usize {
    4
}
fn default_interval() -> u64 {
    30
}

/// A named device profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Management host, `host[:port]` or a full `https://` URL.
    pub host: String,

    /// Administrative partition this profile reconciles.
    #[serde(default = "default_partition")]
    pub partition: String,

    /// Auth scheme: "token" or "basic".
    #[serde(default = "default_auth")]
    pub auth: String,

    pub username: Option<String>,

    /// Password in plaintext (prefer the keyring or an env variable).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// Accept self-signed management certificates.
    pub insecure: Option<bool>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    /// Concurrent device operations per kind.
    pub jobs: Option<usize>,
}

fn default_partition() -> String {
    "Common".into()
}
fn default_auth() -> String {
    "token".into()
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            partition: default_partition(),
            auth: default_auth(),
            username: None,
            password: None,
            password_env: None,
            insecure: None,
            timeout: None,
            jobs: None,
        }
    }

    pub fn auth_scheme(&self) -> Result<AuthScheme, ConfigError> {
        match self.auth.as_str() {
            "token" => Ok(AuthScheme::Token),
            "basic" => Ok(AuthScheme::Basic),
            other => Err(ConfigError::Validation {
                field: "auth".into(),
                reason: format!("expected 'token' or 'basic', got '{other}'"),
            }),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "bigsync", "bigsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("bigsync");
    p
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the config from the canonical path plus `BIGSYNC_*` environment
/// overrides.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from an explicit path. Missing files yield defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BIGSYNC_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize the config to TOML at the canonical path.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), config)
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(config)?;
    std::fs::write(path, text)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a profile's password from the credential chain: the profile's
/// named env variable, then `BIGSYNC_PASSWORD`, then the system keyring,
/// then plaintext in the config file.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(value) = std::env::var(env_name) {
            return Ok(SecretString::from(value));
        }
    }

    if let Ok(value) = std::env::var("BIGSYNC_PASSWORD") {
        return Ok(SecretString::from(value));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(ref password) = profile.password {
        return Ok(SecretString::from(password.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the full username/password pair for a profile.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var("BIGSYNC_USERNAME").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;
    let password = resolve_password(profile, profile_name)?;
    Ok(Credentials { username, password })
}

/// Store a password in the system keyring for a profile.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(password)?;
    Ok(())
}

/// Remove a profile's password from the system keyring, if present.
pub fn forget_password(profile_name: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

// ── Connection building ─────────────────────────────────────────────

/// Build a device connection from a profile, credential chain included.
pub fn profile_to_connection(
    profile: &Profile,
    profile_name: &str,
) -> Result<Connection, ConfigError> {
    if profile.host.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let credentials = resolve_credentials(profile, profile_name)?;
    Ok(Connection {
        url: profile.host.clone(),
        credentials,
        auth: profile.auth_scheme()?,
        accept_invalid_certs: profile.insecure.unwrap_or(false),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(default_timeout())),
    })
}

// ── Tests ───────────────────────────────────────────────────────────
