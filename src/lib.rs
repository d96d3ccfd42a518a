pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::rates::RateBoard;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Rates {
        refresh: bool,
    },
    Convert {
        amount: String,
        from: String,
        to: String,
        rate: Option<String>,
        refresh: bool,
    },
    Calc,
    History {
        clear: bool,
        json: bool,
    },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("KyatFast starting...");

    let config = load_config(config_path)?;
    let currencies = config.currency_set()?;
    let board = RateBoard::new(config.base_rates()?);
    let source = providers::from_config(&config)?;
    let labels = cli::labels::Labels::for_language(config.language);

    match command {
        AppCommand::Rates { refresh } => {
            cli::rates::run(&board, source.as_ref(), &currencies, refresh, labels).await
        }
        AppCommand::Convert {
            amount,
            from,
            to,
            rate,
            refresh,
        } => {
            let table = if refresh {
                board.refresh(source.as_ref()).await.table.clone()
            } else {
                board.snapshot().table.clone()
            };
            let calculator =
                cli::convert::prepare(currencies, table, &amount, &from, &to, rate.as_deref())?;
            println!("{}", cli::convert::render_conversion(&calculator, labels));
            Ok(())
        }
        AppCommand::Calc => {
            let store = store::open_history_store(&config)?;
            cli::calc::run(
                currencies,
                &board,
                source.as_ref(),
                store.as_ref(),
                Duration::from_secs(config.rates.refresh_interval_secs),
                config.language,
            )
            .await
        }
        AppCommand::History { clear, json } => {
            let store = store::open_history_store(&config)?;
            cli::history::run(store.as_ref(), currencies.local_code(), clear, json, labels)
        }
    }
}
