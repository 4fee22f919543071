//! Command dispatch.

use std::path::Path;

use tracing::debug;

use super::command::{Cli, Commands, MarketCommand, SettingsCommand};
use super::{account, market, paths, settings};
use crate::adapter::outbound::bus::BroadcastHub;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::factory::ledger::build_ledger;

/// Load configuration for a CLI invocation.
///
/// An explicit `--config` path must exist. Without one, the default config
/// file is used when present and built-in defaults otherwise. The storage
/// path falls back to `~/.pointbook/data`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => Config::load(path)?,
        None => {
            let default = paths::default_config();
            if default.is_file() {
                Config::load(default)?
            } else {
                Config::parse_toml("")?
            }
        }
    };
    if config.storage.path.is_none() {
        config.storage.path = Some(paths::default_data_dir());
    }
    Ok(config)
}

/// Run one parsed command.
///
/// # Errors
///
/// Returns the first error raised by configuration, wiring or the handler.
pub fn execute(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    config.init_logging();
    debug!(storage = ?config.storage.backend, bus = ?config.bus.backend, "Configuration loaded");

    let hub = BroadcastHub::new(config.bus.capacity);
    let ledger = build_ledger(&config, &hub)?;

    match cli.command {
        Commands::Market(command) => match command {
            MarketCommand::Create(args) => market::create(&ledger, args),
            MarketCommand::List => market::list(&ledger),
            MarketCommand::Show(args) => market::show(&ledger, &args.market_id),
            MarketCommand::Quote(args) => market::quote(&ledger, args),
            MarketCommand::Close(args) => market::close(&ledger, args),
            MarketCommand::Resolve(args) => market::resolve(&ledger, args),
            MarketCommand::Cancel(args) => market::cancel(&ledger, args),
        },
        Commands::Trade(args) => account::trade(&ledger, args),
        Commands::Claim(args) => account::claim(&ledger, args),
        Commands::Faucet(args) => account::faucet(&ledger, &args.wallet),
        Commands::Wallet(args) => account::show(&ledger, &args.wallet),
        Commands::Settings(command) => match command {
            SettingsCommand::Show => settings::show(&ledger),
            SettingsCommand::Admin(args) => settings::admin(&ledger, args),
            SettingsCommand::Allow(args) => settings::allow(&ledger, args),
            SettingsCommand::Map(args) => settings::map(&ledger, args),
        },
        Commands::Reset(args) => settings::reset(&ledger, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(Error::Config(ConfigError::ReadFile(_)))));
    }

    #[test]
    fn explicit_config_keeps_its_storage_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, crate::testkit::config::file_backed_toml(dir.path())).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(config.storage.path.is_some());
    }
}
