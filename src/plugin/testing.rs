//! Test doubles for the installer's collaborators.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use crate::model::plugin::{Plugin, PluginCommand};
use crate::plugin::error::{ConfigError, MetadataError};
use crate::plugin::metadata::PluginMetadata;
use crate::plugin::store::{PluginConfigStore, PluginRepository};

/// In-memory registry that counts persists and can be told to fail them.
#[derive(Debug)]
pub struct MemoryPluginConfig {
    pub home: PathBuf,
    pub plugins: Vec<Plugin>,
    pub repositories: Vec<PluginRepository>,
    pub writes: Cell<usize>,
    pub fail_writes: bool,
}

impl MemoryPluginConfig {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            plugins: Vec::new(),
            repositories: Vec::new(),
            writes: Cell::new(0),
            fail_writes: false,
        }
    }

    pub fn with_plugin(mut self, plugin: Plugin) -> Self {
        self.add_plugin(plugin);
        self
    }
}

impl PluginConfigStore for MemoryPluginConfig {
    fn plugins(&self) -> Vec<&Plugin> {
        self.plugins.iter().collect()
    }

    fn get_plugin(&self, name: &str) -> Option<&Plugin> {
        self.plugins.iter().find(|plugin| plugin.name == name)
    }

    fn add_plugin(&mut self, plugin: Plugin) {
        match self.plugins.iter_mut().find(|p| p.name == plugin.name) {
            Some(existing) => *existing = plugin,
            None => self.plugins.push(plugin),
        }
    }

    fn plugin_home(&self) -> &Path {
        &self.home
    }

    fn plugin_repositories(&self) -> &[PluginRepository] {
        &self.repositories
    }

    fn plugin_repositories_mut(&mut self) -> &mut Vec<PluginRepository> {
        &mut self.repositories
    }

    fn write_plugin_config(&self) -> Result<(), ConfigError> {
        if self.fail_writes {
            return Err(ConfigError::Write {
                path: self.home.join("config.toml"),
                source: std::io::Error::other("disk full"),
            });
        }
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Extractor that returns a canned plugin for every path and records the last path.
#[derive(Debug)]
pub struct StaticMetadata {
    pub plugin: Option<Plugin>,
    pub last_path: std::cell::RefCell<Option<PathBuf>>,
}

impl StaticMetadata {
    pub fn returning(plugin: Plugin) -> Self {
        Self {
            plugin: Some(plugin),
            last_path: Default::default(),
        }
    }

    /// Extractor that rejects every binary.
    pub fn failing() -> Self {
        Self {
            plugin: None,
            last_path: Default::default(),
        }
    }
}

impl PluginMetadata for StaticMetadata {
    fn get_metadata(&self, path: &Path) -> Result<Plugin, MetadataError> {
        self.last_path.replace(Some(path.to_path_buf()));
        self.plugin.clone().ok_or_else(|| MetadataError::Malformed {
            path: path.to_path_buf(),
            reason: "not a plugin".to_string(),
        })
    }
}

/// Shorthand for `Plugin { name, commands: [(name, alias)...] }`.
pub fn plugin(name: &str, commands: &[(&str, &str)]) -> Plugin {
    Plugin {
        name: name.to_string(),
        commands: commands
            .iter()
            .map(|(command, alias)| PluginCommand::new(*command, *alias))
            .collect(),
        ..Plugin::default()
    }
}
