use std::{
    fs,
    path::{Path, PathBuf},
};

use legacy_runtime::{
    resolve_script_url, CALL_AGENT_RUNTIME_NAMESPACE, DEFAULT_LOG_PREFIX, LEGACY_SCRIPT_ID,
    LEGACY_SCRIPT_RELATIVE_URL, SUBSCRIPTION_ROLE_RUNTIME_NAMESPACE,
};
use serde::Deserialize;
use shared::domain::{DEFAULT_ACTION_EVENTS, INPUT};
use thiserror::Error;

/// Read from the working directory when no explicit file is given.
pub const DEFAULT_SETTINGS_FILE: &str = "agent_workspace.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("cannot resolve legacy script '{path}' against '{base}'")]
    InvalidUrl {
        base: String,
        path: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub event_types: Vec<String>,
    pub log_prefix: String,
    /// URL of the module bundle; the legacy script path is relative to it.
    pub asset_base_url: String,
    pub legacy_script_path: String,
    pub legacy_script_id: String,
    pub call_agent_namespace: String,
    pub subscription_role_namespace: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            event_types: DEFAULT_ACTION_EVENTS
                .iter()
                .chain([&INPUT])
                .map(|kind| kind.to_string())
                .collect(),
            log_prefix: DEFAULT_LOG_PREFIX.into(),
            asset_base_url: "http://127.0.0.1:8000/static/assets/js/app/index.js".into(),
            legacy_script_path: LEGACY_SCRIPT_RELATIVE_URL.into(),
            legacy_script_id: LEGACY_SCRIPT_ID.into(),
            call_agent_namespace: CALL_AGENT_RUNTIME_NAMESPACE.into(),
            subscription_role_namespace: SUBSCRIPTION_ROLE_RUNTIME_NAMESPACE.into(),
        }
    }
}

impl Settings {
    pub fn legacy_script_url(&self) -> Result<String, SettingsError> {
        resolve_script_url(&self.asset_base_url, &self.legacy_script_path).map_err(|source| {
            SettingsError::InvalidUrl {
                base: self.asset_base_url.clone(),
                path: self.legacy_script_path.clone(),
                source,
            }
        })
    }
}

/// Defaults, then the settings file, then `APP__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => {
            let fallback = Path::new(DEFAULT_SETTINGS_FILE);
            if fallback.exists() {
                read_settings_file(fallback)?
            } else {
                Settings::default()
            }
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.legacy_script_url()?;
    Ok(settings)
}

pub fn read_settings_file(path: &Path) -> Result<Settings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<Settings>(&raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("APP__EVENT_TYPES") {
        settings.event_types = v
            .split(',')
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(v) = lookup("APP__LOG_PREFIX") {
        settings.log_prefix = v;
    }
    if let Some(v) = lookup("APP__ASSET_BASE_URL") {
        settings.asset_base_url = v;
    }
    if let Some(v) = lookup("APP__LEGACY_SCRIPT_PATH") {
        settings.legacy_script_path = v;
    }
    if let Some(v) = lookup("APP__LEGACY_SCRIPT_ID") {
        settings.legacy_script_id = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
