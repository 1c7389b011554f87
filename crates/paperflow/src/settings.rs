//! Application settings
//!
//! Loaded from an optional config file (format taken from its extension) overlaid
//! with `PAPERFLOW__`-prefixed environment variables, e.g. `PAPERFLOW__BACKEND__URL`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File};
use paperflow_client::{SupabaseConfig, TableNames};
use paperflow_core::DEFAULT_AUTHOR;
use serde::Deserialize;

use crate::startup::logging::LogRotation;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PAPERFLOW";

/// Separator between prefix and nested keys
pub const ENV_SEPARATOR: &str = "__";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub tables: TableNames,
    pub logging: LoggingSettings,
    pub workspace: WorkspaceSettings,
}

/// Managed backend endpoint
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub url: String,
    pub anon_key: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        let defaults = SupabaseConfig::default();
        Self {
            url: defaults.url,
            anon_key: defaults.anon_key,
            connect_timeout_ms: defaults.connect_timeout_ms,
            read_timeout_ms: defaults.read_timeout_ms,
        }
    }
}

impl BackendSettings {
    pub fn client_config(&self) -> SupabaseConfig {
        SupabaseConfig::new(&self.url, &self.anon_key)
            .with_timeouts(self.connect_timeout_ms, self.read_timeout_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level used when `RUST_LOG` is unset
    pub level: String,
    pub console: bool,
    /// Directory for log files; no file logging when unset
    pub dir: Option<PathBuf>,
    pub file_name: String,
    pub rotation: LogRotation,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: true,
            dir: None,
            file_name: "paperflow.log".to_string(),
            rotation: LogRotation::Daily,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Author recorded on notes added without one
    pub default_author: String,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            default_author: DEFAULT_AUTHOR.to_string(),
        }
    }
}

impl Settings {
    /// Load from `file` (if given) and the process environment.
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_from(file, None)
    }

    /// Load from `file` and `env` instead of the process environment.
    pub fn load_from(file: Option<&Path>, env: Option<HashMap<String, String>>) -> anyhow::Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.backend.url.trim().is_empty() {
            anyhow::bail!("backend.url must not be empty");
        }
        if self.workspace.default_author.trim().is_empty() {
            anyhow::bail!("workspace.default_author must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_from(None, env(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.tables.sections, "contract_sections");
        assert_eq!(settings.workspace.default_author, "Kari");
        assert!(settings.logging.dir.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::load_from(
            None,
            env(&[
                ("PAPERFLOW__BACKEND__URL", "https://abc.supabase.co"),
                ("PAPERFLOW__BACKEND__ANON_KEY", "public-anon"),
                ("PAPERFLOW__BACKEND__READ_TIMEOUT_MS", "1500"),
                ("PAPERFLOW__TABLES__NOTES", "notes_v2"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.backend.url, "https://abc.supabase.co");
        assert_eq!(settings.backend.anon_key, "public-anon");
        assert_eq!(settings.backend.read_timeout_ms, 1500);
        assert_eq!(settings.tables.notes, "notes_v2");
        assert_eq!(settings.tables.pushes, "policy_pushes");
    }

    #[test]
    fn test_client_config() {
        let backend = BackendSettings {
            url: "https://abc.supabase.co/".to_string(),
            anon_key: "k".to_string(),
            connect_timeout_ms: 100,
            read_timeout_ms: 200,
        };
        let config = backend.client_config();
        assert_eq!(config.url, "https://abc.supabase.co");
        assert_eq!(config.connect_timeout_ms, 100);
        assert_eq!(config.read_timeout_ms, 200);
    }

    #[test]
    fn test_blank_author_rejected() {
        let err = Settings::load_from(None, env(&[("PAPERFLOW__WORKSPACE__DEFAULT_AUTHOR", " ")]))
            .unwrap_err();
        assert!(err.to_string().contains("default_author"));
    }
}
