use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
pub const CURRENT_VERSION: u32 = 1;

pub const URL_ENV: &str = "CENTREON_URL";
pub const USERNAME_ENV: &str = "CENTREON_USERNAME";
pub const PASSWORD_ENV: &str = "CENTREON_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    /// Centreon web root, e.g. `https://centreon.example/centreon`.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Poller reloaded after a run, and attached to new hosts.
    #[serde(default = "default_instance")]
    pub instance: String,
    #[serde(default = "default_true")]
    pub apply_on_change: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_instance() -> String {
    "Central".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            url: String::new(),
            username: String::new(),
            password: String::new(),
            instance: default_instance(),
            apply_on_change: true,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SyncConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply `CENTREON_*` overrides from `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (var, field) in [
            (URL_ENV, &mut self.url),
            (USERNAME_ENV, &mut self.username),
            (PASSWORD_ENV, &mut self.password),
        ] {
            if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
                tracing::debug!(var, "config overridden from environment");
                *field = value;
            }
        }
    }

    /// Check that everything needed to reach the API is set.
    pub fn validate(&self) -> eyre::Result<()> {
        let missing: Vec<&str> = [
            ("url", self.url.trim()),
            ("username", self.username.trim()),
            ("password", self.password.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(eyre::eyre!(
                "missing config value(s): {}. Set them in the config file or via {URL_ENV}, \
                 {USERNAME_ENV} and {PASSWORD_ENV}",
                missing.join(", ")
            ));
        }
        if self.timeout_secs == 0 {
            return Err(eyre::eyre!("timeout_secs must be greater than 0"));
        }
        Ok(())
    }
}

/// Redacted config info, safe to print.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigInfo {
    pub path: Option<String>,
    pub config_version: u32,
    pub url: String,
    pub username: String,
    pub password_set: bool,
    pub instance: String,
    pub apply_on_change: bool,
    pub timeout_secs: u64,
}

pub fn default_config_path() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("centreon-sync").join("config.json"))
}

/// Resolve the effective config.
///
/// An explicit `path` must exist. The default location may be absent, in
/// which case defaults plus environment overrides are used.
pub fn resolve(path: Option<&Path>) -> eyre::Result<(SyncConfig, Option<PathBuf>)> {
    let (mut config, source) = match path {
        Some(path) => (load_config(path)?, Some(path.to_path_buf())),
        None => {
            let default = default_config_path()?;
            if default.exists() {
                (load_config(&default)?, Some(default))
            } else {
                tracing::debug!(path = %default.display(), "no config file, using defaults");
                (SyncConfig::default(), None)
            }
        }
    };
    config.apply_env(|var| std::env::var(var).ok());
    Ok((config, source))
}

pub fn load_config(path: &Path) -> eyre::Result<SyncConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| eyre::eyre!("config at {} is not valid JSON: {e}", path.display()))?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: SyncConfig = serde_json::from_value(migrated)?;
    tracing::debug!(path = %path.display(), version = config.config_version, "config loaded");
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
///
/// Each migration is a pure transform on the raw JSON value.
pub fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update centreon-sync."
        ));
    }

    let obj = json
        .as_object_mut()
        .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;

    // v0 -> v1: stamp the version; pre-versioned files have the same fields
    if from_version < 1 {
        obj.insert("config_version".to_string(), 1.into());
        tracing::info!("migrated config v0 -> v1 (added config_version)");
    }

    // Future migrations go here:
    // if from_version < 2 { ... }

    Ok(json)
}

pub fn config_info(config: &SyncConfig, path: Option<&Path>) -> ConfigInfo {
    ConfigInfo {
        path: path.map(|p| p.display().to_string()),
        config_version: config.config_version,
        url: config.url.clone(),
        username: config.username.clone(),
        password_set: !config.password.is_empty(),
        instance: config.instance.clone(),
        apply_on_change: config.apply_on_change,
        timeout_secs: config.timeout_secs,
    }
}
