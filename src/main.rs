use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modstrip::config::ConfigError;
use modstrip::{
    Config, ErrorClass, HookError, HookInstallMode, HookInstaller, ReplaceError,
    ReplaceTransaction, StripOutcome,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "modstrip",
    version,
    about = "Keep local go.mod replace directives out of your commits"
)]
struct Cli {
    /// More output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Config file (default: <config dir>/modstrip/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Remove local replace directives from go.mod, or put them back
    Replace {
        /// Restore go.mod from the backup
        #[arg(long)]
        undo: bool,
        /// Only strip when go.mod is staged for commit
        #[arg(long)]
        replace_only_if_staged: bool,
        /// Directory containing go.mod
        path: PathBuf,
    },
    /// Install pre-commit and post-commit hooks that run `replace`
    InstallHooks {
        /// Command the hooks invoke instead of the configured one
        #[arg(long, value_name = "CMD")]
        base_command: Option<String>,
        /// Add to existing hooks instead of refusing to overwrite them
        #[arg(long)]
        merge: bool,
        /// Repository root
        path: PathBuf,
    },
    /// Remove the lines added by `install-hooks`
    RemoveHooks {
        /// Repository root
        path: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn replace(config: &Config, path: &Path, undo: bool, staged_only: bool) -> Result<()> {
    let transaction = ReplaceTransaction::from_config(config);

    if undo {
        transaction
            .restore(path, staged_only)
            .with_context(|| format!("restore of {} failed", path.display()))?;
        return Ok(());
    }

    let outcome = transaction
        .strip(path, staged_only)
        .with_context(|| format!("strip of {} failed", path.display()))?;
    match outcome {
        StripOutcome::Stripped { removed } => {
            tracing::info!(count = removed.len(), "Removed local replace directives");
        }
        StripOutcome::NoLocalDirectives => {
            tracing::info!("No local replace directives");
        }
        StripOutcome::NotStaged => {
            tracing::info!("Manifest is not staged, left unchanged");
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Replace {
            undo,
            replace_only_if_staged,
            path,
        } => replace(&config, &path, undo, replace_only_if_staged),
        Command::InstallHooks {
            base_command,
            merge,
            path,
        } => {
            let base_command = base_command.as_deref().unwrap_or(&config.base_command);
            let mode = if merge {
                HookInstallMode::Merge
            } else {
                HookInstallMode::Create
            };
            let hooks = HookInstaller::from_config(&config)
                .install(&path, base_command, mode)
                .context("failed to install hooks")?;
            println!("Installed {}", hooks.pre_commit.display());
            println!("Installed {}", hooks.post_commit.display());
            Ok(())
        }
        Command::RemoveHooks { path } => HookInstaller::from_config(&config)
            .remove(&path)
            .context("failed to remove hooks"),
    }
}

/// Class of the first error in the chain that carries one
fn error_class(err: &anyhow::Error) -> Option<ErrorClass> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<ReplaceError>() {
            Some(e.class())
        } else if let Some(e) = cause.downcast_ref::<HookError>() {
            Some(e.class())
        } else {
            cause.downcast_ref::<ConfigError>().map(ConfigError::class)
        }
    })
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        if let Some(class) = error_class(&err) {
            tracing::debug!(%class, "Command failed");
        }
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}
