mod cli;
mod model;
mod plugin;

use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, RepoCommand};
use model::config::{AppConfig, project_dirs};
use plugin::PluginManager;
use plugin::metadata::ProcessMetadata;
use plugin::registry::BuiltinCommands;
use plugin::store::{FilePluginConfig, PluginConfigStore};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("FAILED\n{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load()?;
    let _guard = init_logging(&config)?;

    let home = config.plugin_home()?;
    tracing::info!(plugin_home = %home.display(), "plugbox starting");

    let store = FilePluginConfig::load(&home)?;
    let mut manager = PluginManager::new(
        store,
        ProcessMetadata::new(config.plugins.metadata_arg.as_str()),
        BuiltinCommands::from_cli(&Cli::command()),
    )
    .keep_staged_copies(config.plugins.keep_staged_copies);

    let result = dispatch(&mut manager, cli.command);
    if let Err(err) = &result {
        tracing::warn!("command failed: {err}");
    }
    result
}

fn dispatch(
    manager: &mut PluginManager<FilePluginConfig, ProcessMetadata, BuiltinCommands>,
    command: Command,
) -> Result<()> {
    match command {
        Command::Install { path, force } => {
            let plugin = manager.install(&path, force)?;
            println!(
                "Plugin {} {} successfully installed.",
                plugin.name, plugin.version
            );
        }
        Command::List => {
            for row in manager.list_notifications() {
                println!("{row}");
            }
        }
        Command::Repo(RepoCommand::Add { name, url }) => {
            let repo = manager.add_plugin_repository(&name, &url)?;
            println!("{} added as '{}'", repo.url, repo.name);
        }
        Command::Repo(RepoCommand::Remove { name }) => {
            manager.remove_plugin_repository(&name)?;
            println!("{name} has been removed from the registry.");
        }
        Command::Repo(RepoCommand::List) => {
            for row in manager.repository_notifications() {
                println!("{row}");
            }
        }
    }

    tracing::debug!(
        config = %manager.store().config_path().display(),
        installed = manager.store().plugins().len(),
        "command finished"
    );
    Ok(())
}

/// Log to a daily file under the data dir (never stdout). `RUST_LOG` overrides the configured filter.
fn init_logging(config: &AppConfig) -> Result<WorkerGuard> {
    let log_dir = project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "plugbox.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    Ok(guard)
}
