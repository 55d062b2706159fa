use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Version reported by a plugin binary.
///
/// Ordered component-wise, so `1.10.0 > 1.9.3`. The all-zero version means the
/// plugin never declared one and renders as `N/A`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid plugin version '{input}'")]
pub struct ParseVersionError {
    pub input: String,
}

impl PluginVersion {
    pub fn new(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build,
        }
    }

    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            return f.write_str("N/A");
        }
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

impl FromStr for PluginVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "N/A" {
            return Ok(Self::default());
        }

        let invalid = || ParseVersionError {
            input: s.to_string(),
        };

        let mut parts = [0u32; 3];
        let mut count = 0;
        for segment in trimmed.split('.') {
            let slot = parts.get_mut(count).ok_or_else(invalid)?;
            *slot = segment.parse().map_err(|_| invalid())?;
            count += 1;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl TryFrom<String> for PluginVersion {
    type Error = ParseVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PluginVersion> for String {
    fn from(version: PluginVersion) -> Self {
        version.to_string()
    }
}

/// A subcommand contributed by a plugin. An empty alias means "no alias".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginCommand {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl PluginCommand {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
            help_text: None,
        }
    }
}

/// A plugin as reported by its binary, and later as registered in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    #[serde(default)]
    pub version: PluginVersion,
    /// Install path. Only set once the binary has been placed in the plugin home.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
    #[serde(default)]
    pub commands: Vec<PluginCommand>,
}

/// Command names and aliases of a candidate that collide with existing ones.
///
/// Duplicates are kept: a token colliding with two installed commands is listed twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub names: Vec<String>,
    pub aliases: Vec<String>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.aliases.is_empty()
    }

    pub fn sort_case_insensitive(&mut self) {
        self.names.sort_by_key(|name| name.to_lowercase());
        self.aliases.sort_by_key(|alias| alias.to_lowercase());
    }
}
