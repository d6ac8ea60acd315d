use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use weatherdesk_core::{
    Config, Favorites, SearchHistory, Session, Units, provider_from_config,
    config::DEFAULT_CURRENT_URL,
    storage::{FAVORITES_FILE, HISTORY_FILE},
};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weatherdesk",
    version,
    about = "Current weather and 5-day forecasts from OpenWeather"
)]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `interactive`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, endpoint and default units.
    Configure,

    /// Show current conditions for a city.
    Current {
        city: String,

        /// metric or imperial; defaults to the configured units.
        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,
    },

    /// Show the 5-day forecast for a city.
    Forecast {
        city: String,

        /// metric or imperial; defaults to the configured units.
        #[arg(long, value_parser = parse_units)]
        units: Option<Units>,
    },

    /// List recent searches.
    History {
        /// Forget all recent searches.
        #[arg(long)]
        clear: bool,
    },

    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },

    /// Search repeatedly from a prompt.
    Interactive,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    List,
    Add { city: String },
    Remove { city: String },
    Toggle { city: String },
}

fn parse_units(value: &str) -> Result<Units, String> {
    Units::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };

        match self.command.unwrap_or(Command::Interactive) {
            Command::Configure => configure(&config_path),
            Command::Current { city, units } => {
                let config = Config::load_from(&config_path)?;
                let provider = provider_from_config(&config)?;
                let units = units.unwrap_or(config.units);
                let (mut history, favorites) = open_storage(&config)?;

                let city = require_city(&city)?;
                history.record(city)?;

                match provider.current(city, units).await {
                    Ok(current) => {
                        print!("{}", render::current(&current, units, favorites.contains(city)));
                        Ok(())
                    }
                    Err(err) => {
                        print!("{}", render::blank_current());
                        Err(err).context("Error fetching weather data")
                    }
                }
            }
            Command::Forecast { city, units } => {
                let config = Config::load_from(&config_path)?;
                let provider = provider_from_config(&config)?;
                let units = units.unwrap_or(config.units);
                let (mut history, _) = open_storage(&config)?;

                let city = require_city(&city)?;
                history.record(city)?;

                match provider.forecast(city, units).await {
                    Ok(days) => {
                        println!("5-day forecast for {city}:");
                        print!("{}", render::forecast(&days, units));
                        Ok(())
                    }
                    Err(err) => {
                        print!("{}", render::forecast(&[], units));
                        Err(err).context("Error fetching forecast data")
                    }
                }
            }
            Command::History { clear } => {
                let config = Config::load_or_default(&config_path)?;
                let (mut history, _) = open_storage(&config)?;

                if clear {
                    history.clear()?;
                    println!("Search history cleared.");
                } else {
                    let entries = history.entries().iter().map(String::as_str);
                    print!("{}", render::city_list("Recent searches", entries));
                }
                Ok(())
            }
            Command::Favorites { action } => {
                let config = Config::load_or_default(&config_path)?;
                let (_, favorites) = open_storage(&config)?;
                manage_favorites(favorites, action.unwrap_or(FavoritesAction::List))
            }
            Command::Interactive => {
                let config = Config::load_from(&config_path)?;
                let provider = provider_from_config(&config)?;
                let (history, favorites) = open_storage(&config)?;

                let session = Session::new(Arc::from(provider), config.units, history, favorites);
                interactive::run(session).await
            }
        }
    }
}

fn configure(path: &Path) -> Result<()> {
    let mut config = Config::load_or_default(path)?;

    let key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    let key = key.trim();
    if key.is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(key.to_string());

    let url = Text::new("Current weather endpoint:")
        .with_default(if config.api.url.is_empty() {
            DEFAULT_CURRENT_URL
        } else {
            &config.api.url
        })
        .prompt()?;
    config.api.url = url.trim().to_string();

    let start = Units::all()
        .iter()
        .position(|u| *u == config.units)
        .unwrap_or_default();
    config.units = Select::new("Default units:", Units::all().to_vec())
        .with_starting_cursor(start)
        .prompt()?;

    config.save_to(path)?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

fn manage_favorites(mut favorites: Favorites, action: FavoritesAction) -> Result<()> {
    match action {
        FavoritesAction::List => print!("{}", render::city_list("Favorites", favorites.iter())),
        FavoritesAction::Add { city } => {
            let city = require_city(&city)?;
            if favorites.add(city)? {
                println!("Added {city} to favorites.");
            } else {
                println!("{city} is already a favorite.");
            }
        }
        FavoritesAction::Remove { city } => {
            if favorites.remove(&city)? {
                println!("Removed {} from favorites.", city.trim());
            } else {
                println!("{} is not a favorite.", city.trim());
            }
        }
        FavoritesAction::Toggle { city } => {
            let city = require_city(&city)?;
            if favorites.toggle(city)? {
                println!("Added {city} to favorites.");
            } else {
                println!("Removed {city} from favorites.");
            }
        }
    }
    Ok(())
}

fn open_storage(config: &Config) -> Result<(SearchHistory, Favorites)> {
    let dir = config.storage_dir()?;
    let history = SearchHistory::load(dir.join(HISTORY_FILE))?;
    let favorites = Favorites::load(dir.join(FAVORITES_FILE))?;
    Ok((history, favorites))
}

fn require_city(city: &str) -> Result<&str> {
    let city = city.trim();
    if city.is_empty() {
        bail!("Please enter a city name");
    }
    Ok(city)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["weatherdesk"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn units_flag_is_parsed() {
        let cli =
            Cli::try_parse_from(["weatherdesk", "current", "Oslo", "--units", "imperial"]).unwrap();

        match cli.command {
            Some(Command::Current { city, units }) => {
                assert_eq!(city, "Oslo");
                assert_eq!(units, Some(Units::Imperial));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn bad_units_are_rejected() {
        let err = Cli::try_parse_from(["weatherdesk", "forecast", "Oslo", "--units", "kelvin"])
            .unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn favorites_subcommands_parse() {
        let cli = Cli::try_parse_from(["weatherdesk", "favorites", "toggle", "Rome"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Favorites { action: Some(FavoritesAction::Toggle { ref city }) }) if city == "Rome"
        ));
    }

    #[test]
    fn require_city_trims_and_rejects_blank() {
        assert_eq!(require_city("  Lima ").unwrap(), "Lima");
        assert!(require_city("   ").is_err());
    }
}
