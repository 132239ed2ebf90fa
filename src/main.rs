use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use folio::cli::add::AddRequest;
use folio::core::instrument::InstrumentType;
use folio::core::log::init_logging;
use rust_decimal::Decimal;

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

impl From<Commands> for folio::AppCommand {
    fn from(cmd: Commands) -> folio::AppCommand {
        match cmd {
            Commands::Search { query } => folio::AppCommand::Search { query },
            Commands::Add {
                ticker,
                invested,
                name,
                isin,
                instrument_type,
                currency,
            } => folio::AppCommand::Add(AddRequest {
                ticker,
                invested,
                name,
                isin,
                instrument_type,
                currency,
            }),
            Commands::Remove { ticker } => folio::AppCommand::Remove { ticker },
            Commands::List => folio::AppCommand::List,
            Commands::Refresh => folio::AppCommand::Refresh,
            Commands::Summary => folio::AppCommand::Summary,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Search instruments by name, ticker or ISIN
    Search { query: String },
    /// Start tracking an instrument
    Add {
        ticker: String,
        /// Amount invested, in the instrument's currency
        #[arg(long)]
        invested: Decimal,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        isin: Option<String>,
        /// equity, etf, bond or crypto
        #[arg(long = "type")]
        instrument_type: Option<InstrumentType>,
        #[arg(long)]
        currency: Option<String>,
    },
    /// Stop tracking an instrument
    Remove { ticker: String },
    /// List tracked instruments
    List,
    /// Fetch current prices for all instruments
    Refresh,
    /// Display portfolio value and profit/loss
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => folio::cli::setup::setup_at_path(path),
            None => folio::cli::setup::setup(),
        },
        Some(cmd) => folio::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
