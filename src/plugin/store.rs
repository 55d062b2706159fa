use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::plugin::Plugin;
use crate::plugin::error::ConfigError;

/// A named remote source of plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRepository {
    pub name: String,
    pub url: String,
}

/// Registry of installed plugins and the directory they live in.
pub trait PluginConfigStore {
    /// Installed plugins, ordered by name.
    fn plugins(&self) -> Vec<&Plugin>;
    fn get_plugin(&self, name: &str) -> Option<&Plugin>;
    /// Insert or replace by plugin name.
    fn add_plugin(&mut self, plugin: Plugin);
    fn plugin_home(&self) -> &Path;
    fn plugin_repositories(&self) -> &[PluginRepository];
    fn plugin_repositories_mut(&mut self) -> &mut Vec<PluginRepository>;
    fn write_plugin_config(&self) -> Result<(), ConfigError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PluginConfigFile {
    #[serde(default)]
    plugins: BTreeMap<String, Plugin>,
    #[serde(default)]
    repositories: Vec<PluginRepository>,
}

/// Registry persisted as `<plugin home>/config.toml`.
#[derive(Debug)]
pub struct FilePluginConfig {
    home: PathBuf,
    file: PluginConfigFile,
}

impl FilePluginConfig {
    pub const FILE_NAME: &'static str = "config.toml";

    /// Load the registry under `home`. A missing file is an empty registry.
    pub fn load(home: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let home = home.into();
        let path = home.join(Self::FILE_NAME);

        let file = match fs::read_to_string(&path) {
            Ok(raw) => toml::from_str::<PluginConfigFile>(&raw)
                .map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => PluginConfigFile::default(),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        debug!(path = %path.display(), count = file.plugins.len(), "loaded plugin config");
        Ok(Self { home, file })
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join(Self::FILE_NAME)
    }
}

impl PluginConfigStore for FilePluginConfig {
    fn plugins(&self) -> Vec<&Plugin> {
        self.file.plugins.values().collect()
    }

    fn get_plugin(&self, name: &str) -> Option<&Plugin> {
        self.file.plugins.get(name)
    }

    fn add_plugin(&mut self, plugin: Plugin) {
        self.file.plugins.insert(plugin.name.clone(), plugin);
    }

    fn plugin_home(&self) -> &Path {
        &self.home
    }

    fn plugin_repositories(&self) -> &[PluginRepository] {
        &self.file.repositories
    }

    fn plugin_repositories_mut(&mut self) -> &mut Vec<PluginRepository> {
        &mut self.file.repositories
    }

    /// Written to a sibling temp file and renamed into place.
    fn write_plugin_config(&self) -> Result<(), ConfigError> {
        let path = self.config_path();
        let write_err = |source| ConfigError::Write {
            path: path.clone(),
            source,
        };

        let raw = toml::to_string_pretty(&self.file)?;
        fs::create_dir_all(&self.home).map_err(write_err)?;

        let mut staged = tempfile::NamedTempFile::new_in(&self.home).map_err(write_err)?;
        staged.write_all(raw.as_bytes()).map_err(write_err)?;
        staged
            .persist(&path)
            .map_err(|err| write_err(err.error))?;

        debug!(path = %path.display(), count = self.file.plugins.len(), "saved plugin config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::plugin::{PluginCommand, PluginVersion};
    use tempfile::TempDir;

    fn sample(name: &str) -> Plugin {
        Plugin {
            name: name.to_string(),
            version: PluginVersion::new(1, 0, 2),
            location: Some(PathBuf::from(format!("/plugins/{name}"))),
            commands: vec![
                PluginCommand::new("do-it", "d"),
                PluginCommand {
                    help_text: Some("other thing".to_string()),
                    ..PluginCommand::new("other", "")
                },
            ],
        }
    }

    #[test]
    fn missing_file_is_empty_registry() {
        let dir = TempDir::new().unwrap();
        let store = FilePluginConfig::load(dir.path()).unwrap();
        assert!(store.plugins().is_empty());
        assert!(store.plugin_repositories().is_empty());
        assert_eq!(store.plugin_home(), dir.path());
    }

    #[test]
    fn persists_plugins_and_repositories() {
        let dir = TempDir::new().unwrap();
        let mut store = FilePluginConfig::load(dir.path()).unwrap();
        store.add_plugin(sample("zeta"));
        store.add_plugin(sample("alpha"));
        store.plugin_repositories_mut().push(PluginRepository {
            name: "community".to_string(),
            url: "https://plugins.example.com".to_string(),
        });
        store.write_plugin_config().unwrap();

        let reloaded = FilePluginConfig::load(dir.path()).unwrap();
        let names: Vec<&str> = reloaded.plugins().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(reloaded.get_plugin("zeta"), Some(&sample("zeta")));
        assert_eq!(reloaded.plugin_repositories()[0].name, "community");
    }

    #[test]
    fn add_plugin_replaces_by_name() {
        let dir = TempDir::new().unwrap();
        let mut store = FilePluginConfig::load(dir.path()).unwrap();
        store.add_plugin(sample("foo"));

        let mut upgraded = sample("foo");
        upgraded.version = PluginVersion::new(2, 0, 0);
        store.add_plugin(upgraded);

        assert_eq!(store.plugins().len(), 1);
        assert_eq!(
            store.get_plugin("foo").map(|p| p.version),
            Some(PluginVersion::new(2, 0, 0))
        );
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FilePluginConfig::FILE_NAME), "plugins = [").unwrap();
        assert!(matches!(
            FilePluginConfig::load(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
