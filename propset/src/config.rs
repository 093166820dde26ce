//! Name-resolution settings for annotated classes.
//!
//! Nothing in the crate reads a configuration implicitly: a [`PropsConfig`] only
//! takes part in resolution when it is handed to
//! [`crate::ClassRegistry::declarations`] or
//! [`crate::Declarations::from_class_with`]. [`PropsConfig::load_or_default`] is
//! an opt-in for applications that want a per-user file.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::utils::error::{PropError, PropResult};

/// Environment variable overriding [`PropsConfig::default_path`].
pub const ENV_CONFIG_PATH: &str = "PROPSET_CONFIG_PATH";

/// Namespace fallback and global type aliases.
///
/// ```toml
/// namespace = "app"
///
/// [aliases]
/// Int = "app::columns::IntColumn"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropsConfig {
    /// Namespace used for classes registered without one.
    pub namespace: Option<String>,

    /// Type aliases, checked after a class's own imports.
    pub aliases: BTreeMap<String, String>,
}

impl PropsConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    /// Per-user configuration file: `$PROPSET_CONFIG_PATH` if set, otherwise
    /// `propset/config.toml` under `%APPDATA%` on Windows and under
    /// `$XDG_CONFIG_HOME` (or `$HOME/.config`) elsewhere.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            return path.into();
        }

        let base = if cfg!(target_os = "windows") {
            std::env::var_os("APPDATA").map(PathBuf::from)
        } else {
            std::env::var_os("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|| std::env::var_os("HOME").map(|home| Path::new(&home).join(".config")))
        };

        base.unwrap_or_default().join("propset").join("config.toml")
    }

    /// Read the file at [`Self::default_path`]; a missing file gives the
    /// default configuration.
    pub fn load_or_default() -> PropResult<Self> {
        let path = Self::default_path();
        if !path.exists() {
            debug!("No propset configuration at '{}'", path.display());
            return Ok(Self::default());
        }
        Self::load_from_toml(&path)
    }

    pub fn from_toml_str(toml_str: &str, origin: &str) -> PropResult<Self> {
        toml::from_str(toml_str).map_err(|source| PropError::ConfigParseError {
            source,
            file: origin.to_string(),
        })
    }

    pub fn load_from_toml(path: &Path) -> PropResult<Self> {
        let config = Self::from_toml_str(&std::fs::read_to_string(path)?, &path.display().to_string())?;
        debug!(
            "Loaded {} type aliases from '{}'",
            config.aliases.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn save_to_toml(&self, path: &Path) -> PropResult<()> {
        let toml_str = toml::to_string(self).map_err(|err| {
            PropError::Unknown(format!(
                "cannot serialize configuration for '{}': {err}",
                path.display()
            ))
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml_str)?;
        Ok(())
    }
}
