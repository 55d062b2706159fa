use serde::Deserialize;

use crate::model::plugin::{Plugin, PluginCommand, PluginVersion};

/// Metadata a plugin binary prints when asked to describe itself.
///
/// Missing names and commands parse successfully; rejecting them is the installer's job.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: PluginVersion,
    #[serde(default)]
    pub commands: Vec<CommandDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandDef {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
}

impl PluginManifest {
    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

impl From<PluginManifest> for Plugin {
    fn from(manifest: PluginManifest) -> Self {
        Self {
            name: manifest.name,
            version: manifest.version,
            location: None,
            commands: manifest
                .commands
                .into_iter()
                .map(|command| PluginCommand {
                    help_text: command.help_text,
                    ..PluginCommand::new(command.name, command.alias.unwrap_or_default())
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_manifest() {
        let raw = r#"
            name = "foo"
            version = "1.2.3"

            [[commands]]
            name = "do-foo"
            alias = "df"
            help_text = "does foo"

            [[commands]]
            name = "undo-foo"
        "#;

        let plugin = Plugin::from(PluginManifest::parse(raw).unwrap());
        assert_eq!(plugin.name, "foo");
        assert_eq!(plugin.version, PluginVersion::new(1, 2, 3));
        assert_eq!(plugin.location, None);
        assert_eq!(plugin.commands.len(), 2);
        assert_eq!(plugin.commands[0].alias, "df");
        assert_eq!(plugin.commands[0].help_text.as_deref(), Some("does foo"));
        assert_eq!(plugin.commands[1], PluginCommand::new("undo-foo", ""));
    }

    #[test]
    fn empty_manifest_is_not_a_parse_error() {
        let plugin = Plugin::from(PluginManifest::parse("").unwrap());
        assert!(plugin.name.is_empty());
        assert!(plugin.commands.is_empty());
        assert!(plugin.version.is_unset());
    }

    #[test]
    fn bad_version_is_a_parse_error() {
        assert!(PluginManifest::parse("name = \"foo\"\nversion = \"x.y\"").is_err());
    }
}
