use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::model::plugin::Plugin;
use crate::plugin::error::MetadataError;
use crate::plugin::manifest::PluginManifest;

/// Reads the declared name, version and commands of a candidate binary.
pub trait PluginMetadata {
    fn get_metadata(&self, path: &Path) -> Result<Plugin, MetadataError>;
}

/// Runs the candidate with a single argument and parses the TOML manifest it prints.
#[derive(Debug, Clone)]
pub struct ProcessMetadata {
    metadata_arg: String,
}

impl ProcessMetadata {
    pub fn new(metadata_arg: impl Into<String>) -> Self {
        Self {
            metadata_arg: metadata_arg.into(),
        }
    }
}

impl PluginMetadata for ProcessMetadata {
    fn get_metadata(&self, path: &Path) -> Result<Plugin, MetadataError> {
        debug!(path = %path.display(), arg = %self.metadata_arg, "querying plugin metadata");

        let output = Command::new(path)
            .arg(&self.metadata_arg)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| MetadataError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;

        if !output.status.success() {
            return Err(MetadataError::Exited {
                path: path.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let malformed = |reason: String| MetadataError::Malformed {
            path: path.to_path_buf(),
            reason,
        };

        let stdout = String::from_utf8(output.stdout).map_err(|err| malformed(err.to_string()))?;
        let manifest = PluginManifest::parse(&stdout).map_err(|err| malformed(err.to_string()))?;

        Ok(manifest.into())
    }
}
