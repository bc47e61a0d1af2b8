//! Configuration management commands.

use clap::Subcommand;
use rangeday_core::{Config, StoreBackend};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the active configuration as TOML
    Show,
    /// Set a configuration value
    Set {
        /// One of: persistence.backend, persistence.api_base_url,
        /// persistence.debounce_ms
        key: String,
        value: String,
    },
    /// Print the configuration file path
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }

        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "persistence.backend" => {
                    config.persistence.backend = match value.as_str() {
                        "local" => StoreBackend::Local,
                        "remote" => StoreBackend::Remote,
                        other => return Err(format!("unknown backend '{other}'").into()),
                    };
                }
                "persistence.api_base_url" => {
                    config.persistence.api_base_url = if value.is_empty() {
                        None
                    } else {
                        Some(value)
                    };
                }
                "persistence.debounce_ms" => {
                    config.persistence.debounce_ms = value
                        .parse()
                        .map_err(|_| format!("invalid debounce '{value}'"))?;
                }
                other => return Err(format!("unknown configuration key '{other}'").into()),
            }
            config.save()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }

        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }

    Ok(())
}
