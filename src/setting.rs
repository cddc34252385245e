use std::{collections::BTreeMap, path::{Path, PathBuf}};

use anyhow::Context;
use serde::Deserialize;
use serde_yaml::Value;

use crate::AppResult;

/// Immutable settings, loaded once at startup and handed to whoever needs them.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Upper bound on any page of messages.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

fn default_database_url() -> String {
    "sqlite://chatrooms.db?mode=rwc".to_owned()
}

fn default_max_connections() -> u32 {
    16
}

fn default_max_page_size() -> usize {
    200
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            max_page_size: default_max_page_size(),
            extra: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Reads `SETTINGS_YAML` if set, else `config/<SETTINGS>.yml`
    /// (`config/settings.yml` by default). `DATABASE_URL` overrides the file.
    pub fn load() -> AppResult<Self> {
        let mut settings = match dotenv::var("SETTINGS_YAML") {
            Ok(yaml) => Self::from_yaml(&yaml)?,
            Err(_) => Self::from_path(Self::settings_path())?,
        };

        if let Ok(url) = dotenv::var("DATABASE_URL") {
            settings.database_url = url;
        }

        Ok(settings)
    }

    pub fn settings_path() -> PathBuf {
        let name = dotenv::var("SETTINGS").unwrap_or_else(|_| "settings".to_owned());
        Path::new("config").join(format!("{name}.yml"))
    }

    pub fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> AppResult<Self> {
        // an empty document is a null, not a mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml).context("parsing settings yaml")?)
    }

    /// Any key not covered by a typed field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
