//! # fmm-cli
//!
//! Command line mod manager for Factorio.
//!
//! This is the entry point for the `fmm` binary. It parses arguments, sets up
//! logging and the panic hook, loads configuration and dispatches to the
//! command handlers.

use clap::{Args, Parser, Subcommand};
use fmm_core::error::{FmmError, FmmResult};
use fmm_core::ModIdent;
use std::collections::HashMap;
use std::process::ExitCode;
use tracing::{debug, error};

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Enable, disable and install Factorio mods
#[derive(Parser)]
#[command(name = "fmm", version, about = "Factorio mod manager")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Game installation directory
    #[arg(long, global = true, value_name = "PATH")]
    pub game_dir: Option<String>,

    /// Mods directory (default: <game-dir>/mods)
    #[arg(long, global = true, value_name = "PATH")]
    pub mods_dir: Option<String>,

    /// Configuration file (default: <config dir>/fmm/fmm.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Show what would change without writing mod-list.json or downloading
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Flags that override configuration keys
    pub fn config_overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        if let Some(game_dir) = &self.game_dir {
            overrides.insert("game_dir".to_string(), game_dir.clone());
        }
        if let Some(mods_dir) = &self.mods_dir {
            overrides.insert("mods_dir".to_string(), mods_dir.clone());
        }
        overrides
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enable mods and their required dependencies
    Enable {
        /// Mods to enable, as `name` or `name@version`
        #[arg(required_unless_present = "all", value_name = "MOD")]
        mods: Vec<ModIdent>,

        /// Enable the newest release of every installed mod
        #[arg(long, conflicts_with_all = ["mods", "ignore_deps"])]
        all: bool,

        /// Enable only the named mods
        #[arg(long)]
        ignore_deps: bool,
    },
    /// Disable mods (all non-internal mods when none are named)
    Disable {
        /// Mods to disable, as `name` or `name@version`
        #[arg(value_name = "MOD")]
        mods: Vec<ModIdent>,

        /// Disable internal mods too when disabling everything
        #[arg(long, alias = "include-base-mod", conflicts_with = "mods")]
        include_internal: bool,
    },
    /// Download mods and their dependencies without enabling them
    Install {
        #[arg(required = true, value_name = "MOD")]
        mods: Vec<ModIdent>,
    },
    /// Delete installed releases, the newest one when no version is given
    Remove {
        #[arg(required = true, value_name = "MOD")]
        mods: Vec<ModIdent>,
    },
    /// Delete every zipped release except the newest of each mod
    Dedup,
    /// List installed mods
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.global.verbose);
    setup_panic_handler();

    debug!("Starting fmm v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", ErrorFormatter::new().format_error(&err));
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> FmmResult<ExitCode> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| FmmError::io("Failed to create async runtime".to_string(), e))?;

    rt.block_on(async {
        let ctx = CommandContext::new(&cli.global).await?;
        commands::dispatch_command(cli.command, &ctx).await?;

        if ctx.error_count() > 0 {
            Ok(ExitCode::FAILURE)
        } else {
            Ok(ExitCode::SUCCESS)
        }
    })
}

fn setup_logging(verbose: bool) {
    let default_filter = if verbose {
        "fmm=debug,fmm_core=debug,fmm_config=debug,fmm_registry=debug,fmm_portal=debug,fmm_resolver=debug"
    } else {
        "fmm=info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("fmm encountered an unexpected error: {}", panic_info);
        eprintln!("fmm crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
