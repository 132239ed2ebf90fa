pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::add::AddRequest;
use crate::core::config::AppConfig;
use crate::core::resolver::FailoverResolver;
use anyhow::Result;
use tracing::{debug, info};

pub enum AppCommand {
    Search { query: String },
    Add(AddRequest),
    Remove { ticker: String },
    List,
    Refresh,
    Summary,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("folio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        currency = %config.currency,
        storage = ?config.storage,
        providers = config.providers.len(),
        "Loaded config"
    );

    let store = store::open_store(&config)?;

    match command {
        AppCommand::Search { query } => cli::search::run(&resolver(&config)?, &query).await,
        AppCommand::Add(request) => {
            cli::add::run(store.as_ref(), &resolver(&config)?, request, &config.currency).await
        }
        AppCommand::Remove { ticker } => cli::remove::run(store.as_ref(), &ticker).await,
        AppCommand::List => cli::list::run(store.as_ref()).await,
        AppCommand::Refresh => cli::refresh::run(store.as_ref(), &resolver(&config)?).await,
        AppCommand::Summary => cli::summary::run(store.as_ref()).await,
    }
}

fn resolver(config: &AppConfig) -> Result<FailoverResolver> {
    let resolver = FailoverResolver::new(providers::build_providers(config)?);
    debug!(providers = ?resolver.provider_names(), "Provider order");
    Ok(resolver)
}
