use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Unit system sent to the API as the `units` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Metric, Units::Imperial]
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_speed_symbol(&self) -> &'static str {
        match self {
            Units::Metric => "m/s",
            Units::Imperial => "mph",
        }
    }

    /// The other unit system.
    pub fn toggled(self) -> Self {
        match self {
            Units::Metric => Units::Imperial,
            Units::Imperial => Units::Metric,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported: metric, imperial."
            )),
        }
    }
}

/// Snapshot of the weather for one city at fetch time.
///
/// Every field is copied from the API response; absent fields stay at their
/// zero/empty default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity in percent.
    pub humidity: i64,
    /// Pressure in hPa.
    pub pressure: i64,
    pub wind_speed: f64,
    /// Meteorological wind direction in degrees.
    pub wind_direction: i64,
    /// Short condition group, e.g. "Clouds".
    pub condition: String,
    pub description: String,
    pub icon: String,
    /// Epoch seconds.
    pub sunrise: i64,
    /// Epoch seconds.
    pub sunset: i64,
}

/// Aggregate of one calendar date's 3-hourly forecast samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastSummary {
    pub date: NaiveDate,
    pub min_temp: f64,
    pub max_temp: f64,
    pub description: String,
    pub icon: String,
    pub condition: String,
}

impl DailyForecastSummary {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            min_temp: 0.0,
            max_temp: 0.0,
            description: String::new(),
            icon: String::new(),
            condition: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed = Units::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
    }

    #[test]
    fn unknown_units_error() {
        let err = Units::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown unit system"));
    }

    #[test]
    fn toggled_switches_system() {
        assert_eq!(Units::Metric.toggled(), Units::Imperial);
        assert_eq!(Units::Imperial.toggled(), Units::Metric);
    }

    #[test]
    fn units_deserialize_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            units: Units,
        }

        let w: Wrapper = toml::from_str("units = \"imperial\"").unwrap();
        assert_eq!(w.units, Units::Imperial);
    }
}
