use chrono::{DateTime, Local};
use std::fmt::Write;

use weatherdesk_core::{
    CurrentConditions, DailyForecastSummary, Units,
    provider::openweather::{IconSize, icon_url},
};

const BLANK: &str = "--";

pub fn current(c: &CurrentConditions, units: Units, favorite: bool) -> String {
    let mut out = String::new();
    let star = if favorite { " ★" } else { "" };
    let place = if c.country.is_empty() {
        c.city.clone()
    } else {
        format!("{}, {}", c.city, c.country)
    };

    let _ = writeln!(out, "{place}{star}");
    let _ = writeln!(
        out,
        "  Temperature: {:.1}{t} (feels like {:.1}{t})",
        c.temperature,
        c.feels_like,
        t = units.temperature_symbol()
    );
    let _ = writeln!(out, "  Weather:     {}", or_blank(&capitalize(&c.description)));
    let _ = writeln!(out, "  Humidity:    {}%", c.humidity);
    let _ = writeln!(out, "  Pressure:    {} hPa", c.pressure);
    let _ = writeln!(
        out,
        "  Wind:        {:.1} {} from {} ({}°)",
        c.wind_speed,
        units.wind_speed_symbol(),
        compass(c.wind_direction),
        c.wind_direction
    );
    let _ = writeln!(
        out,
        "  Sunrise:     {}   Sunset: {}",
        clock(c.sunrise),
        clock(c.sunset)
    );
    if !c.icon.is_empty() {
        let _ = writeln!(out, "  Icon:        {}", icon_url(&c.icon, IconSize::X2));
    }

    out
}

/// Placeholder card shown after a failed fetch.
pub fn blank_current() -> String {
    let mut out = String::new();
    for label in ["Temperature", "Weather", "Humidity", "Wind"] {
        let _ = writeln!(out, "  {:<12} {BLANK}", format!("{label}:"));
    }
    out
}

pub fn forecast(days: &[DailyForecastSummary], units: Units) -> String {
    if days.is_empty() {
        return format!("  {BLANK}\n");
    }

    let t = units.temperature_symbol();
    let mut out = String::new();
    for day in days {
        let _ = writeln!(
            out,
            "  {:<10}  {:>6.1}{t} / {:>6.1}{t}  {}",
            day.date.format("%a %d %b"),
            day.min_temp,
            day.max_temp,
            or_blank(&capitalize(&day.description)),
        );
    }
    out
}

pub fn city_list<'a>(title: &str, cities: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = format!("{title}:\n");
    let mut empty = true;
    for (i, city) in cities.into_iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {city}", i + 1);
        empty = false;
    }
    if empty {
        let _ = writeln!(out, "  (none)");
    }
    out
}

/// 16-point compass name for a wind direction in degrees.
pub fn compass(degrees: i64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
        "NW", "NNW",
    ];
    let idx = ((degrees.rem_euclid(360) as f64 + 11.25) / 22.5) as usize % 16;
    POINTS[idx]
}

/// Local wall-clock time of an epoch timestamp; zero means unknown.
fn clock(epoch: i64) -> String {
    if epoch == 0 {
        return BLANK.to_string();
    }
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| BLANK.to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn or_blank(s: &str) -> &str {
    if s.is_empty() { BLANK } else { s }
}
