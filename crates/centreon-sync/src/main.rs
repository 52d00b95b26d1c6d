use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use eyre::Result;
use tracing_subscriber::EnvFilter;

use centreon_sync::commands::{self, ApplyArgs};
use centreon_sync::config;

#[derive(Parser)]
#[command(name = "centreon-sync")]
#[command(about = "Converge Centreon objects to a manifest", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/centreon-sync/config.json)
    #[arg(short, long, global = true, env = "CENTREON_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every object in the manifest, then reload the poller
    Apply {
        /// Manifest file (JSON)
        manifest: PathBuf,

        /// Do not reload the poller, even if something changed
        #[arg(long)]
        no_applycfg: bool,

        /// Poller to reload (overrides the config file)
        #[arg(long)]
        instance: Option<String>,

        /// Continue with the remaining objects after one fails
        #[arg(long)]
        keep_going: bool,
    },

    /// Show the operations `apply` would run, without changing anything
    Plan {
        /// Manifest file (JSON)
        manifest: PathBuf,
    },

    /// Print the effective config with the password redacted
    ShowConfig,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let (config, source) = config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Apply {
            manifest,
            no_applycfg,
            instance,
            keep_going,
        } => {
            let args = ApplyArgs {
                no_applycfg,
                instance,
                keep_going,
            };
            let output = commands::apply(&config, &manifest, &args)?;
            print_json(&output)?;
            if output.failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Plan { manifest } => {
            let output = commands::plan(&config, &manifest)?;
            print_json(&output)?;
        }
        Commands::ShowConfig => {
            print_json(&commands::show_config(&config, source.as_deref()))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
