use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use kyatfast::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for kyatfast::AppCommand {
    fn from(cmd: Commands) -> kyatfast::AppCommand {
        match cmd {
            Commands::Rates { refresh } => kyatfast::AppCommand::Rates { refresh },
            Commands::Convert {
                amount,
                from,
                to,
                rate,
                refresh,
            } => kyatfast::AppCommand::Convert {
                amount,
                from,
                to,
                rate,
                refresh,
            },
            Commands::Calc => kyatfast::AppCommand::Calc,
            Commands::History { clear, json } => kyatfast::AppCommand::History { clear, json },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display today's market rates
    Rates {
        /// Fetch fresh rates before displaying them
        #[arg(short, long)]
        refresh: bool,
    },
    /// Convert an amount once, e.g. `convert 1,500 USD MMK`
    Convert {
        amount: String,
        from: String,
        to: String,
        /// Use this rate instead of the market rate
        #[arg(long)]
        rate: Option<String>,
        /// Fetch fresh rates before converting
        #[arg(short, long)]
        refresh: bool,
    },
    /// Start the interactive calculator
    Calc,
    /// Display saved conversions
    History {
        /// Remove all saved conversions
        #[arg(long)]
        clear: bool,
        /// Print as JSON
        #[arg(long, conflicts_with = "clear")]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let result = match cli.command {
        Some(Commands::Setup) => kyatfast::cli::setup::setup(),
        Some(cmd) => kyatfast::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
