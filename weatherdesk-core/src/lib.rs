//! Core library for the `weatherdesk` client.
//!
//! This crate defines:
//! - Configuration loading (API key, endpoints, default units)
//! - Fetching raw OpenWeather responses and mapping them into flat records
//! - Search history and favorites persistence
//! - A session that runs fetches in the background for an interactive front end
//!
//! It is used by `weatherdesk-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod mapping;
pub mod model;
pub mod provider;
pub mod session;
pub mod storage;

pub use config::Config;
pub use error::{ConfigError, FetchError};
pub use model::{CurrentConditions, DailyForecastSummary, Units};
pub use provider::{WeatherProvider, provider_from_config};
pub use session::{Session, Update};
pub use storage::{Favorites, SearchHistory};
