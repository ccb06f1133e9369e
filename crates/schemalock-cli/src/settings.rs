use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use schemalock_introspect::IntrospectOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "schemalock.toml";
pub const DEFAULT_CONNECTION: &str = "default";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown connection `{0}`")]
    UnknownConnection(String),
    #[error("no `default` connection configured and DATABASE_URL is not set")]
    MissingConnection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Named connection URLs.
    pub connections: BTreeMap<String, String>,
    pub paths: PathSettings,
    pub postgres: PostgresSettings,
    pub seed: SeedSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    pub schema: PathBuf,
    pub seed: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            schema: PathBuf::from("config/schema.json"),
            seed: PathBuf::from("config/seed.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostgresSettings {
    /// Namespace that is captured and restored.
    pub schema: String,
    /// Capture secondary indexes.
    pub include_indexes: bool,
    /// Capture table and column comments.
    pub include_comments: bool,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
            include_indexes: true,
            include_comments: true,
        }
    }
}

impl PostgresSettings {
    pub fn introspect_options(&self) -> IntrospectOptions {
        IntrospectOptions {
            include_indexes: self.include_indexes,
            include_comments: self.include_comments,
            ..IntrospectOptions::for_schema(self.schema.clone())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedSettings {
    pub excluded_tables: Vec<String>,
    pub record_limit: Option<u64>,
    pub conditions: Option<String>,
}

impl Settings {
    /// Read settings from `explicit`, or from [`DEFAULT_CONFIG_FILE`] if it
    /// exists. An explicit file must exist; a missing default file yields the
    /// built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            tracing::debug!(event = "settings_defaulted", path = %path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        let settings = Self::parse(&path, &content)?;
        tracing::debug!(event = "settings_loaded", path = %path.display());
        Ok(settings)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Turn a `--connection` argument into a URL.
    ///
    /// Arguments containing `://` are URLs already. Anything else names an
    /// entry of `[connections]`; `default` falls back to `DATABASE_URL`
    /// (passed in as `env_url`) when the table does not define it.
    pub fn resolve_connection(
        &self,
        arg: Option<&str>,
        env_url: Option<String>,
    ) -> Result<String, SettingsError> {
        let name = arg.unwrap_or(DEFAULT_CONNECTION);
        if name.contains("://") {
            return Ok(name.to_string());
        }

        if let Some(url) = self.connections.get(name) {
            return Ok(url.clone());
        }

        if name == DEFAULT_CONNECTION {
            return env_url.ok_or(SettingsError::MissingConnection);
        }

        Err(SettingsError::UnknownConnection(name.to_string()))
    }

    pub fn schema_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.unwrap_or_else(|| self.paths.schema.clone())
    }

    pub fn seed_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.unwrap_or_else(|| self.paths.seed.clone())
    }

    /// Configured exclusions followed by the ones given on the command line.
    pub fn excluded_tables(&self, flag: Vec<String>) -> Vec<String> {
        let mut tables = self.seed.excluded_tables.clone();
        for table in flag {
            let table = table.trim().to_string();
            if !table.is_empty() && !tables.contains(&table) {
                tables.push(table);
            }
        }
        tables
    }
}
