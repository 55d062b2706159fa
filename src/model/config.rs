use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `plugins.home`.
pub const PLUGIN_HOME_ENV: &str = "PLUGBOX_PLUGIN_HOME";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub plugins: PluginsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct PluginsConfig {
    pub home: String,
    pub metadata_arg: String,
    pub keep_staged_copies: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let defaults = include_str!("../../config/default.toml");

        let mut user = None;
        if let Some(proj_dirs) = project_dirs() {
            let config_path = proj_dirs.config_dir().join("config.toml");
            if config_path.exists() {
                user = Some(fs::read_to_string(&config_path)?);
            }
        }

        Self::from_layers(defaults, user.as_deref())
    }

    /// Merge a user layer over the defaults, table by table.
    pub fn from_layers(defaults: &str, user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(defaults)?;
        if let Some(user) = user {
            let overrides: toml::Table = toml::from_str(user)?;
            merge_tables(&mut merged, overrides);
        }

        Ok(toml::Value::Table(merged).try_into()?)
    }

    /// Resolve the plugin home: env override, then `plugins.home`, then the data dir.
    pub fn plugin_home(&self) -> Result<PathBuf> {
        let data_dir = project_dirs().map(|d| d.data_dir().to_path_buf());
        let home = dirs_home();
        self.resolve_plugin_home(
            std::env::var_os(PLUGIN_HOME_ENV),
            data_dir.as_deref(),
            home.as_deref(),
        )
    }

    fn resolve_plugin_home(
        &self,
        env_override: Option<OsString>,
        data_dir: Option<&Path>,
        home: Option<&Path>,
    ) -> Result<PathBuf> {
        if let Some(path) = env_override.filter(|value| !value.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let configured = self.plugins.home.trim();
        if !configured.is_empty() {
            if !configured.starts_with('~') {
                return Ok(PathBuf::from(configured));
            }
            let home = home.ok_or_else(|| anyhow!("cannot determine home directory"))?;
            return Ok(PathBuf::from(configured.replacen(
                '~',
                &home.to_string_lossy(),
                1,
            )));
        }

        data_dir
            .map(|dir| dir.join("plugins"))
            .ok_or_else(|| anyhow!("cannot determine data directory for plugins"))
    }
}

pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "plugbox")
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
