use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    Config,
    error::{ConfigError, FetchError},
    mapping,
    model::{CurrentConditions, DailyForecastSummary, Units},
    provider::openweather::OpenWeatherProvider,
};

pub mod openweather;

/// Source of raw weather response bodies.
///
/// Implementors only fetch; mapping into records is shared by the provided methods.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Raw current-weather body for `city`.
    async fn fetch_current(&self, city: &str, units: Units) -> Result<String, FetchError>;

    /// Raw 5-day forecast body for `city`.
    async fn fetch_forecast(&self, city: &str, units: Units) -> Result<String, FetchError>;

    async fn current(&self, city: &str, units: Units) -> Result<CurrentConditions, FetchError> {
        let body = self.fetch_current(city, units).await?;
        Ok(mapping::parse_current(&body))
    }

    async fn forecast(
        &self,
        city: &str,
        units: Units,
    ) -> Result<Vec<DailyForecastSummary>, FetchError> {
        let body = self.fetch_forecast(city, units).await?;
        Ok(mapping::parse_forecast(&body))
    }
}

/// Construct the OpenWeather provider from a validated config.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>, ConfigError> {
    config.validate()?;

    Ok(Box::new(OpenWeatherProvider::new(
        config.api.key.clone(),
        config.api.url.clone(),
        config.forecast_url().to_owned(),
    )))
}
