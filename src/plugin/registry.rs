use std::collections::HashSet;

/// Built-in command names that plugin commands must not shadow.
pub trait CommandList {
    fn has_command(&self, name: &str) -> bool;
    fn has_alias(&self, alias: &str) -> bool;
}

/// Built-in commands of this CLI, read from its clap definition.
#[derive(Debug, Clone, Default)]
pub struct BuiltinCommands {
    names: HashSet<String>,
    aliases: HashSet<String>,
}

impl BuiltinCommands {
    pub fn new<N, A>(names: N, aliases: A) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    /// Collect top-level subcommands and their aliases. `help` is generated by
    /// clap at parse time, so it is reserved explicitly.
    pub fn from_cli(command: &clap::Command) -> Self {
        let names = command
            .get_subcommands()
            .map(|sub| sub.get_name())
            .chain(["help"]);
        let aliases = command
            .get_subcommands()
            .flat_map(|sub| sub.get_all_aliases());

        Self::new(names, aliases)
    }
}

impl CommandList for BuiltinCommands {
    fn has_command(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn has_alias(&self, alias: &str) -> bool {
        !alias.is_empty() && self.aliases.contains(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    use crate::cli::Cli;

    #[test]
    fn reads_cli_subcommands_and_aliases() {
        let builtins = BuiltinCommands::from_cli(&Cli::command());

        assert!(builtins.has_command("install"));
        assert!(builtins.has_command("list"));
        assert!(builtins.has_command("repo"));
        assert!(builtins.has_command("help"));
        assert!(builtins.has_alias("i"));
        assert!(builtins.has_alias("ls"));

        assert!(!builtins.has_command("i"));
        assert!(!builtins.has_alias("install"));
        assert!(!builtins.has_command("do-foo"));
    }

    #[test]
    fn empty_alias_never_matches() {
        let builtins = BuiltinCommands::new(["push"], [""]);
        assert!(!builtins.has_alias(""));
        assert!(builtins.has_command("push"));
    }
}
