use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

mod cmd;
mod config;
mod ports;
mod r;
mod term;
mod utils;

use cmd::format::StyleOptions;
use cmd::{PackratCommand, PackratCommands};
use config::Config;
use ports::WorkbenchContext;

/// Packrat command dispatcher for R projects.
///
/// Usage:
///   packrat-cmd [-v|-q] [--config FILE] [--project DIR] [--r CMD] [--json] <COMMAND>...
///
/// Commands (IDE event names are accepted too, e.g. packratSnapshot):
///   help      open the packrat documentation
///   snapshot  packrat::snapshot()
///   restore   packrat::restore()
///   clean     packrat::clean()
///   bundle    packrat::bundle(file = '<chosen path>', overwrite = TRUE)
///   status    show packages out of sync with the packrat snapshot
///
/// Env:
///   PACKRAT_R        R interpreter command line (default: Rscript)
///   PACKRAT_PROJECT  project directory if --project is not given
///   RUST_LOG         log filter override
///
/// Examples:
///   packrat-cmd snapshot
///   packrat-cmd --project ~/proj status --json
///   packrat-cmd --r "Rscript --vanilla" bundle
#[derive(Parser, Debug)]
#[command(
    name = "packrat-cmd",
    version,
    author,
    about = "Packrat command dispatcher - snapshot, restore, clean, bundle, status",
    propagate_version = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Active project directory (or PACKRAT_PROJECT env; defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    project: Option<PathBuf>,

    /// R interpreter command line (or PACKRAT_R env)
    #[arg(long = "r", value_name = "CMD")]
    interpreter: Option<String>,

    /// Print status as JSON
    #[arg(long)]
    json: bool,

    /// Commands to dispatch; several run concurrently
    #[arg(value_enum, ignore_case = true, required = true, value_name = "COMMAND")]
    commands: Vec<PackratCommand>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let mut config = Config::load(cli.config.as_deref())?.with_env(|k| std::env::var(k).ok());
    if let Some(interpreter) = &cli.interpreter {
        config.interpreter = interpreter.clone();
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run(cli, config))
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let project = cli
        .project
        .clone()
        .or_else(|| {
            std::env::var(config::ENV_PROJECT)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| cwd.clone());
    let context = WorkbenchContext::new(cwd, project.clone());

    let interpreter = r::parse_interpreter(&config.interpreter)
        .with_context(|| format!("Invalid R interpreter '{}'", config.interpreter))?;
    debug!(interpreter = interpreter.original(), project = %project.display(), "starting");

    let style = StyleOptions::detect();
    let prompter = Arc::new(term::Prompter::new());
    let console = Arc::new(r::RConsole::new(interpreter.clone(), project));
    let dependencies = Arc::new(r::RDependencyManager::new(
        interpreter.clone(),
        config.min_version.clone(),
        config.cran_mirror.clone(),
        config.auto_install,
        prompter.clone(),
    ));
    let dialogs = Arc::new(term::TerminalFileDialogs::new(prompter, style.clone()));
    let server = Arc::new(r::RStatusServer::new(interpreter));
    let display = Arc::new(term::TerminalDisplay::new(
        &config.help_base_url,
        style,
        cli.json,
    )?);

    let commands = Arc::new(PackratCommands::new(
        context,
        dependencies,
        console.clone(),
        dialogs,
        server,
        display,
    ));

    let running: Vec<_> = cli
        .commands
        .iter()
        .map(|c| (*c, commands.spawn(*c)))
        .collect();
    for (command, handle) in running {
        if let Err(e) = handle.await {
            error!(%command, error = %e, "command task failed");
        }
    }
    console.drain().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_several_commands_and_event_names() {
        let cli = Cli::try_parse_from(["packrat-cmd", "-v", "snapshot", "packratStatus"]).unwrap();
        assert_eq!(
            cli.commands,
            vec![PackratCommand::Snapshot, PackratCommand::Status]
        );
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn command_names_ignore_case() {
        let cli = Cli::try_parse_from(["packrat-cmd", "Bundle", "HELP"]).unwrap();
        assert_eq!(
            cli.commands,
            vec![PackratCommand::Bundle, PackratCommand::Help]
        );
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["packrat-cmd"]).is_err());
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(Cli::try_parse_from(["packrat-cmd", "install"]).is_err());
    }

    #[test]
    fn global_flags() {
        let cli = Cli::try_parse_from([
            "packrat-cmd",
            "--r",
            "Rscript --vanilla",
            "--project",
            "/tmp/proj",
            "--json",
            "-q",
            "status",
        ])
        .unwrap();
        assert_eq!(cli.interpreter.as_deref(), Some("Rscript --vanilla"));
        assert_eq!(cli.project, Some(PathBuf::from("/tmp/proj")));
        assert!(cli.json);
        assert!(cli.quiet);
    }
}
