//! Error types for plugin validation and installation.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors surfaced by the installer and the commands built on it.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The binary reported no name or no commands.
    #[error("File {} is not a valid plugin binary.", .path.display())]
    PluginInvalid { path: PathBuf },

    /// Command names or aliases collide with built-ins or other installed plugins.
    #[error("{}", conflict_message(.plugin_name, .plugin_version, .command_names, .command_aliases))]
    PluginCommandsConflict {
        plugin_name: String,
        plugin_version: String,
        command_names: Vec<String>,
        command_aliases: Vec<String>,
    },

    #[error(
        "Plugin {name} {version} could not be installed. A plugin with that name is already installed.\nTIP: Use 'plugbox install {} --force' to force a reinstall.",
        .path.display()
    )]
    PluginAlreadyInstalled {
        name: String,
        version: String,
        path: PathBuf,
    },

    #[error(
        "File not found locally, make sure the file exists at given path {}",
        .path.display()
    )]
    FileNotFound { path: PathBuf },

    #[error("Plugin repo named '{name}' already exists, please use another name.")]
    RepositoryNameTaken { name: String },

    #[error("{url} ({name}) already exists.")]
    RepositoryUrlTaken { name: String, url: String },

    #[error("Plugin repository {name} does not exist.")]
    RepositoryNotFound { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures reading metadata from a candidate binary.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("failed to run plugin binary {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("plugin binary {} exited with {status}: {stderr}", .path.display())]
    Exited {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("plugin binary {} reported malformed metadata: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
}

/// Failures loading or persisting the installed-plugin registry.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read plugin config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse plugin config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize plugin config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write plugin config {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for installer operations.
pub type Result<T> = std::result::Result<T, InstallError>;

fn conflict_message(
    plugin_name: &str,
    plugin_version: &str,
    command_names: &[String],
    command_aliases: &[String],
) -> String {
    let prefix = format!(
        "Plugin {plugin_name} v{plugin_version} could not be installed as it contains commands with"
    );

    match (command_names.is_empty(), command_aliases.is_empty()) {
        (false, false) => {
            let all: Vec<&str> = command_names
                .iter()
                .chain(command_aliases)
                .map(String::as_str)
                .collect();
            format!(
                "{prefix} names and aliases that are already used: {}.",
                all.join(", ")
            )
        }
        (false, true) => format!(
            "{prefix} names that are already used: {}.",
            command_names.join(", ")
        ),
        (true, false) => format!(
            "{prefix} aliases that are already used: {}.",
            command_aliases.join(", ")
        ),
        (true, true) => format!("{prefix} names or aliases that are already used."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(names: &[&str], aliases: &[&str]) -> InstallError {
        InstallError::PluginCommandsConflict {
            plugin_name: "foo".to_string(),
            plugin_version: "1.2.3".to_string(),
            command_names: names.iter().map(|s| s.to_string()).collect(),
            command_aliases: aliases.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn conflict_message_variants() {
        assert_eq!(
            conflict(&["push", "scale"], &[]).to_string(),
            "Plugin foo v1.2.3 could not be installed as it contains commands with names that are already used: push, scale."
        );
        assert_eq!(
            conflict(&[], &["p"]).to_string(),
            "Plugin foo v1.2.3 could not be installed as it contains commands with aliases that are already used: p."
        );
        assert_eq!(
            conflict(&["push"], &["p"]).to_string(),
            "Plugin foo v1.2.3 could not be installed as it contains commands with names and aliases that are already used: push, p."
        );
        assert_eq!(
            conflict(&[], &[]).to_string(),
            "Plugin foo v1.2.3 could not be installed as it contains commands with names or aliases that are already used."
        );
    }

    #[test]
    fn invalid_and_missing_file_messages_carry_the_path() {
        let invalid = InstallError::PluginInvalid {
            path: PathBuf::from("/tmp/candidate"),
        };
        assert_eq!(
            invalid.to_string(),
            "File /tmp/candidate is not a valid plugin binary."
        );

        let missing = InstallError::FileNotFound {
            path: PathBuf::from("./nope"),
        };
        assert!(missing.to_string().ends_with("given path ./nope"));
    }

    #[test]
    fn io_errors_pass_through_unchanged() {
        let err: InstallError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(&err, InstallError::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied));
        assert_eq!(err.to_string(), "denied");
    }
}
