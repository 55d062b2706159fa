use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::model::plugin::{ConflictReport, Plugin};
use crate::plugin::error::{InstallError, Result};
use crate::plugin::metadata::PluginMetadata;
use crate::plugin::registry::CommandList;
use crate::plugin::store::{FilePluginConfig, PluginConfigStore};

/// Staging area under the plugin home. Never the system temp dir: the plugin
/// home is owned by the user, so nobody else can swap a staged binary before it runs.
pub const TEMP_DIR: &str = "temp";

const STAGED_MODE: u32 = 0o700;
/// Installed binaries may be shared by several users of one plugin home.
const INSTALLED_MODE: u32 = 0o755;

/// Validates candidate plugin binaries and installs them into the plugin home.
///
/// Not synchronised: callers run one installation at a time per store.
#[derive(Debug)]
pub struct PluginInstaller<S> {
    store: S,
}

impl<S: PluginConfigStore> PluginInstaller<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Copy `path` to a fresh owner-only executable under `<plugin home>/temp`.
    ///
    /// A file may be left behind in the temp dir if the copy fails.
    pub fn create_executable_copy(&self, path: &Path) -> Result<PathBuf> {
        let temp_dir = self.store.plugin_home().join(TEMP_DIR);
        create_private_dir(&temp_dir)?;

        let (file, staged_path) = tempfile::Builder::new()
            .prefix("plugin-")
            .tempfile_in(&temp_dir)?
            .keep()
            .map_err(io::Error::from)?;
        drop(file);

        fs::copy(path, &staged_path)?;
        set_mode(&staged_path, STAGED_MODE)?;

        debug!(
            source = %path.display(),
            staged = %staged_path.display(),
            "staged plugin binary"
        );
        Ok(staged_path)
    }

    /// True only if `path` can be stat'ed. Every stat failure counts as missing.
    pub fn file_exists(path: &Path) -> bool {
        fs::metadata(path).is_ok()
    }

    pub fn is_plugin_installed(&self, name: &str) -> bool {
        self.store.get_plugin(name).is_some()
    }

    /// Read the metadata of the binary at `path` and check it can be installed
    /// without shadowing a built-in or another plugin's commands.
    ///
    /// Extractor failures are returned unchanged. The store is never modified.
    pub fn get_and_validate_plugin(
        &self,
        metadata: &impl PluginMetadata,
        builtins: &impl CommandList,
        path: &Path,
    ) -> Result<Plugin> {
        let plugin = metadata.get_metadata(path)?;

        if plugin.name.is_empty() || plugin.commands.is_empty() {
            warn!(path = %path.display(), "plugin binary has no name or no commands");
            return Err(InstallError::PluginInvalid {
                path: path.to_path_buf(),
            });
        }

        let report = self.find_conflicts(&plugin, builtins);
        if !report.is_empty() {
            warn!(
                plugin = %plugin.name,
                names = ?report.names,
                aliases = ?report.aliases,
                "plugin commands conflict with existing commands"
            );
            return Err(InstallError::PluginCommandsConflict {
                plugin_name: plugin.name,
                plugin_version: plugin.version.to_string(),
                command_names: report.names,
                command_aliases: report.aliases,
            });
        }

        Ok(plugin)
    }

    fn find_conflicts(&self, candidate: &Plugin, builtins: &impl CommandList) -> ConflictReport {
        // Older versions of the same plugin are being replaced, not collided with.
        let others: Vec<&Plugin> = self
            .store
            .plugins()
            .into_iter()
            .filter(|installed| installed.name != candidate.name)
            .collect();

        let mut report = ConflictReport::default();
        for command in &candidate.commands {
            if builtins.has_command(&command.name) || builtins.has_alias(&command.name) {
                report.names.push(command.name.clone());
            }

            if builtins.has_alias(&command.alias) || builtins.has_command(&command.alias) {
                report.aliases.push(command.alias.clone());
            }

            for existing in others.iter().flat_map(|installed| &installed.commands) {
                if command.name == existing.name || command.name == existing.alias {
                    report.names.push(command.name.clone());
                }

                if !command.alias.is_empty()
                    && (command.alias == existing.alias || command.alias == existing.name)
                {
                    report.aliases.push(command.alias.clone());
                }
            }
        }

        report.sort_case_insensitive();
        report
    }

    /// Copy `path` to `<plugin home>/<name>`, register the plugin and persist the store.
    ///
    /// Not transactional: if persisting fails the copied binary stays on disk unregistered.
    pub fn install_plugin_from_path(&mut self, path: &Path, mut plugin: Plugin) -> Result<()> {
        if !is_installable_file_name(&plugin.name) {
            return Err(InstallError::PluginInvalid {
                path: path.to_path_buf(),
            });
        }

        let home = self.store.plugin_home();
        fs::create_dir_all(home)?;
        let install_path = home.join(&plugin.name);

        fs::copy(path, &install_path)?;
        set_mode(&install_path, INSTALLED_MODE)?;

        info!(
            plugin = %plugin.name,
            version = %plugin.version,
            location = %install_path.display(),
            "installed plugin"
        );

        plugin.location = Some(install_path);
        self.store.add_plugin(plugin);
        self.store.write_plugin_config()?;

        Ok(())
    }
}

/// The plugin name becomes a file name inside the plugin home, next to the
/// staging dir, the registry file and the registry's temp files.
fn is_installable_file_name(name: &str) -> bool {
    if name == TEMP_DIR || name == FilePluginConfig::FILE_NAME || name.starts_with(".tmp") {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(STAGED_MODE)
        .create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
