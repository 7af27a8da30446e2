//! Configuration resolution for the referral service.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`$XDG_CONFIG_HOME/referral/settings.json`)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default session token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default referral link lifetime, measured from service start.
pub const DEFAULT_REFERRAL_LINK_EXP: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Complete service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HMAC secret used to sign session tokens. Must be set by some layer.
    #[serde(default)]
    pub jwt_secret: String,
    /// Session token lifetime (humantime format, e.g. `24h`).
    #[serde(default = "default_token_ttl", with = "humantime_serde")]
    pub token_ttl: Duration,
    /// Referral link lifetime (humantime format, e.g. `7d`).
    #[serde(default = "default_referral_link_exp", with = "humantime_serde")]
    pub referral_link_exp: Duration,
    /// Path to the `SQLite` database file.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl: DEFAULT_TOKEN_TTL,
            referral_link_exp: DEFAULT_REFERRAL_LINK_EXP,
            database_path: None,
        }
    }
}

const fn default_token_ttl() -> Duration {
    DEFAULT_TOKEN_TTL
}

const fn default_referral_link_exp() -> Duration {
    DEFAULT_REFERRAL_LINK_EXP
}

/// A config layer where every field is optional.
///
/// Files only override what they mention.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverlay {
    pub jwt_secret: Option<String>,
    #[serde(default, with = "humantime_serde::option")]
    pub token_ttl: Option<Duration>,
    #[serde(default, with = "humantime_serde::option")]
    pub referral_link_exp: Option<Duration>,
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Apply a layer on top of this config.
    pub fn merge(&mut self, overlay: ConfigOverlay) {
        if let Some(secret) = overlay.jwt_secret {
            self.jwt_secret = secret;
        }
        if let Some(ttl) = overlay.token_ttl {
            self.token_ttl = ttl;
        }
        if let Some(exp) = overlay.referral_link_exp {
            self.referral_link_exp = exp;
        }
        if overlay.database_path.is_some() {
            self.database_path = overlay.database_path;
        }
    }

    /// Check that the resolved config is usable.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(Error::Config("jwt secret required".to_string()));
        }
        if self.token_ttl.is_zero() {
            return Err(Error::Config("token_ttl must be non-zero".to_string()));
        }
        if self.referral_link_exp.is_zero() {
            return Err(Error::Config("referral_link_exp must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Session token lifetime in seconds.
    pub fn token_ttl_secs(&self) -> i64 {
        saturating_secs(self.token_ttl)
    }

    /// Absolute referral link expiry (Unix seconds) for links issued by an
    /// engine started at `now`.
    pub fn referral_link_expires_at(&self, now: i64) -> i64 {
        now.saturating_add(saturating_secs(self.referral_link_exp))
    }
}

fn saturating_secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

/// Duration serialization using humantime format.
mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// Load configuration with hierarchical resolution.
///
/// `explicit` must exist when given; the global file is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path()
        && global_path.exists()
    {
        config.merge(load_config_file(&global_path)?);
    }

    if let Some(path) = explicit {
        config.merge(load_config_file(path)?);
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("referral").join("settings.json"))
}

/// Default database location when nothing else is configured.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".referral").join("referral.db"))
}

fn load_config_file(path: &Path) -> Result<ConfigOverlay> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `REFERRAL_*` environment overrides using `lookup` to read variables.
pub fn apply_env_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let duration = |key: &str| -> Result<Option<Duration>> {
        lookup(key)
            .map(|value| {
                humantime::parse_duration(value.trim())
                    .map_err(|e| Error::Config(format!("Invalid {key} '{value}': {e}")))
            })
            .transpose()
    };

    config.merge(ConfigOverlay {
        jwt_secret: lookup("REFERRAL_JWT_SECRET"),
        token_ttl: duration("REFERRAL_TOKEN_TTL")?,
        referral_link_exp: duration("REFERRAL_LINK_EXP")?,
        database_path: lookup("REFERRAL_DB_PATH").map(PathBuf::from),
    });
    Ok(())
}
