//! Lenient mapping of OpenWeather JSON bodies into flat records.
//!
//! Nothing in here fails. Invalid JSON, absent keys and wrong-typed values all
//! collapse to the field's zero/empty default, so a partially broken response
//! still renders whatever it does contain.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::model::{CurrentConditions, DailyForecastSummary};

/// Number of calendar days kept from a forecast response.
pub const FORECAST_DAYS: usize = 5;

const DT_TXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Map a current-weather response body.
pub fn parse_current(body: &str) -> CurrentConditions {
    let json = parse_document(body);

    let sys = &json["sys"];
    let main = &json["main"];
    let wind = &json["wind"];
    let weather = &json["weather"][0];

    CurrentConditions {
        city: str_field(&json, "name"),
        country: str_field(sys, "country"),
        temperature: f64_field(main, "temp"),
        feels_like: f64_field(main, "feels_like"),
        humidity: i64_field(main, "humidity"),
        pressure: i64_field(main, "pressure"),
        wind_speed: f64_field(wind, "speed"),
        wind_direction: i64_field(wind, "deg"),
        condition: str_field(weather, "main"),
        description: str_field(weather, "description"),
        icon: str_field(weather, "icon"),
        sunrise: i64_field(sys, "sunrise"),
        sunset: i64_field(sys, "sunset"),
    }
}

/// Map a 5-day / 3-hour forecast response body into per-date summaries.
///
/// Samples are grouped by the calendar date of their `dt_txt` timestamp. Once
/// [`FORECAST_DAYS`] dates have been seen, samples for further dates are
/// skipped while the admitted dates keep updating.
///
/// Min and max are running values seeded at zero: the max only moves when a
/// sample is above it and the min treats zero as "unset". A date whose samples
/// are all below zero therefore reports a max of zero, and a date containing a
/// sample of exactly zero loses that value as its min. A sample whose `main`
/// object lacks a numeric `temp` counts as zero; one without `main` is ignored.
///
/// Description, icon and condition come from the sample at `12:00`; dates
/// without a noon sample keep them blank.
pub fn parse_forecast(body: &str) -> Vec<DailyForecastSummary> {
    let json = parse_document(body);

    let Some(samples) = json["list"].as_array() else {
        warn!("forecast response has no `list` array, returning no days");
        return Vec::new();
    };

    let mut days: BTreeMap<NaiveDate, DailyForecastSummary> = BTreeMap::new();

    for sample in samples {
        let Some(stamp) = sample_timestamp(sample) else {
            debug!("skipping forecast sample without a usable timestamp");
            continue;
        };
        let date = stamp.date();

        if days.len() >= FORECAST_DAYS && !days.contains_key(&date) {
            continue;
        }

        let day = days
            .entry(date)
            .or_insert_with(|| DailyForecastSummary::new(date));

        let main = &sample["main"];
        if main.is_object() {
            let temp = f64_field(main, "temp");
            if day.max_temp < temp {
                day.max_temp = temp;
            }
            if day.min_temp == 0.0 || day.min_temp > temp {
                day.min_temp = temp;
            }
        }

        let weather = &sample["weather"][0];
        if is_noon_sample(sample, &stamp) && weather.is_object() {
            day.description = str_field(weather, "description");
            day.icon = str_field(weather, "icon");
            day.condition = str_field(weather, "main");
        }
    }

    days.into_values().take(FORECAST_DAYS).collect()
}

fn parse_document(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|err| {
        warn!("response body is not valid JSON ({err}), mapping defaults");
        Value::Null
    })
}

/// Timestamp of a forecast sample: `dt_txt` when present, otherwise `dt` as UTC.
fn sample_timestamp(sample: &Value) -> Option<NaiveDateTime> {
    if let Some(text) = sample["dt_txt"].as_str() {
        return NaiveDateTime::parse_from_str(text, DT_TXT_FORMAT).ok();
    }

    sample["dt"]
        .as_i64()
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.naive_utc())
}

fn is_noon_sample(sample: &Value, stamp: &NaiveDateTime) -> bool {
    match sample["dt_txt"].as_str() {
        Some(text) => text.contains("12:00"),
        None => stamp.format(DT_TXT_FORMAT).to_string().contains("12:00"),
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or_default().to_string()
}

fn f64_field(value: &Value, key: &str) -> f64 {
    value[key].as_f64().unwrap_or_default()
}

fn i64_field(value: &Value, key: &str) -> i64 {
    match &value[key] {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        _ => 0,
    }
}
