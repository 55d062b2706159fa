use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::model::plugin::Plugin;
use crate::plugin::error::{InstallError, Result};
use crate::plugin::installer::PluginInstaller;
use crate::plugin::metadata::PluginMetadata;
use crate::plugin::registry::CommandList;
use crate::plugin::store::{PluginConfigStore, PluginRepository};

/// Command-level flows on top of [`PluginInstaller`].
#[derive(Debug)]
pub struct PluginManager<S, M, C> {
    installer: PluginInstaller<S>,
    metadata: M,
    builtins: C,
    keep_staged_copies: bool,
}

impl<S, M, C> PluginManager<S, M, C>
where
    S: PluginConfigStore,
    M: PluginMetadata,
    C: CommandList,
{
    pub fn new(store: S, metadata: M, builtins: C) -> Self {
        Self {
            installer: PluginInstaller::new(store),
            metadata,
            builtins,
            keep_staged_copies: false,
        }
    }

    pub fn keep_staged_copies(mut self, keep: bool) -> Self {
        self.keep_staged_copies = keep;
        self
    }

    pub fn store(&self) -> &S {
        self.installer.store()
    }

    /// Stage, validate and install the binary at `path`.
    ///
    /// Without `force`, a plugin whose name is already registered is refused.
    pub fn install(&mut self, path: &Path, force: bool) -> Result<Plugin> {
        if !PluginInstaller::<S>::file_exists(path) {
            return Err(InstallError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let staged = self.installer.create_executable_copy(path)?;
        let result = self.install_staged(&staged, path, force);

        if !self.keep_staged_copies {
            if let Err(err) = fs::remove_file(&staged) {
                warn!(path = %staged.display(), "failed to remove staged plugin copy: {err}");
            }
        }

        result
    }

    fn install_staged(&mut self, staged: &Path, source: &Path, force: bool) -> Result<Plugin> {
        let plugin = self
            .installer
            .get_and_validate_plugin(&self.metadata, &self.builtins, staged)
            .map_err(|err| match err {
                // Report the path the user gave, not the staging path.
                InstallError::PluginInvalid { .. } => InstallError::PluginInvalid {
                    path: source.to_path_buf(),
                },
                other => other,
            })?;

        if self.installer.is_plugin_installed(&plugin.name) {
            if !force {
                return Err(InstallError::PluginAlreadyInstalled {
                    name: plugin.name,
                    version: plugin.version.to_string(),
                    path: source.to_path_buf(),
                });
            }
            debug!(plugin = %plugin.name, "reinstalling over existing plugin");
        }

        self.installer
            .install_plugin_from_path(staged, plugin.clone())?;

        let installed = self
            .store()
            .get_plugin(&plugin.name)
            .cloned()
            .unwrap_or(plugin);
        Ok(installed)
    }

    pub fn list_notifications(&self) -> Vec<String> {
        let mut plugins = self.store().plugins();
        if plugins.is_empty() {
            return vec!["No plugins installed.".to_string()];
        }

        plugins.sort_by(|a, b| a.name.cmp(&b.name));

        plugins
            .into_iter()
            .map(|plugin| {
                let commands: Vec<String> = plugin
                    .commands
                    .iter()
                    .map(|command| {
                        if command.alias.is_empty() {
                            command.name.clone()
                        } else {
                            format!("{} ({})", command.name, command.alias)
                        }
                    })
                    .collect();

                format!(
                    "{} {}: {}",
                    plugin.name,
                    plugin.version,
                    commands.join(", ")
                )
            })
            .collect()
    }

    /// Register a repository. Names match case-insensitively, URLs ignoring a trailing `/`.
    ///
    /// Returns the entry as stored, with the URL normalized.
    pub fn add_plugin_repository(&mut self, name: &str, url: &str) -> Result<PluginRepository> {
        let normalized = normalize_url(url);
        let store = self.installer.store_mut();

        for repo in store.plugin_repositories() {
            if repo.name.eq_ignore_ascii_case(name) {
                return Err(InstallError::RepositoryNameTaken {
                    name: name.to_string(),
                });
            }
            if normalize_url(&repo.url) == normalized {
                return Err(InstallError::RepositoryUrlTaken {
                    name: repo.name.clone(),
                    url: repo.url.clone(),
                });
            }
        }

        let repo = PluginRepository {
            name: name.to_string(),
            url: normalized.to_string(),
        };
        store.plugin_repositories_mut().push(repo.clone());
        store.write_plugin_config()?;

        info!(repo = %repo.name, url = %repo.url, "added plugin repository");
        Ok(repo)
    }

    pub fn remove_plugin_repository(&mut self, name: &str) -> Result<()> {
        let store = self.installer.store_mut();
        let repos = store.plugin_repositories_mut();

        let Some(index) = repos
            .iter()
            .position(|repo| repo.name.eq_ignore_ascii_case(name))
        else {
            return Err(InstallError::RepositoryNotFound {
                name: name.to_string(),
            });
        };

        let removed = repos.remove(index);
        store.write_plugin_config()?;

        info!(repo = %removed.name, "removed plugin repository");
        Ok(())
    }

    pub fn repository_notifications(&self) -> Vec<String> {
        let repos = self.store().plugin_repositories();
        if repos.is_empty() {
            return vec!["No plugin repositories added.".to_string()];
        }

        repos
            .iter()
            .map(|repo| format!("{} {}", repo.name, repo.url))
            .collect()
    }
}

fn normalize_url(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}
