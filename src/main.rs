use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use navlens::core::log::init_logging;
use navlens::core::period::ReturnPeriod;

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

impl From<Commands> for navlens::AppCommand {
    fn from(cmd: Commands) -> navlens::AppCommand {
        match cmd {
            Commands::Returns { codes } => navlens::AppCommand::Returns { codes },
            Commands::Candles {
                code,
                window,
                chronological,
            } => navlens::AppCommand::Candles {
                code,
                window,
                chronological,
            },
            Commands::Catalog { remote } => navlens::AppCommand::Catalog { remote },
            Commands::Category { name } => navlens::AppCommand::Category { name },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display trailing returns and risk tiers
    Returns {
        /// Scheme codes; defaults to every configured scheme
        codes: Vec<String>,
    },
    /// Display monthly NAV candles for a scheme
    Candles {
        /// Scheme code
        code: String,
        /// Look-back window: 1M, 6M, 1Y, 3Y, 5Y or ALL
        #[arg(short, long, default_value = "1Y")]
        window: ReturnPeriod,
        /// Sort each month by date before taking open and close
        #[arg(long)]
        chronological: bool,
    },
    /// List configured schemes, or the remote scheme catalog
    Catalog {
        #[arg(long)]
        remote: bool,
    },
    /// Display fund snapshots for a configured category
    Category {
        /// Category name, case-insensitive
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => navlens::cli::setup::setup(cli.config_path.as_deref()),
        Some(cmd) => navlens::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
