//! Front-end state with background fetches.
//!
//! A [`Session`] is owned by a single front-end loop. Searches spawn one tokio
//! task per request type; completions come back over a channel and are applied
//! to the view only when the loop calls [`Session::next_update`], so view state
//! and the persisted collections are never touched from a worker task.

use anyhow::{Result, bail};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{
    error::FetchError,
    model::{CurrentConditions, DailyForecastSummary, Units},
    provider::WeatherProvider,
    storage::{Favorites, SearchHistory},
};

/// Identifies one search. Later searches have larger tickets.
type Ticket = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Current,
    Forecast,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Current => "current weather",
            RequestKind::Forecast => "forecast",
        }
    }
}

#[derive(Debug)]
enum Payload {
    Current(Result<CurrentConditions, FetchError>),
    Forecast(Result<Vec<DailyForecastSummary>, FetchError>),
}

#[derive(Debug)]
struct Completion {
    ticket: Ticket,
    payload: Payload,
}

/// What changed in the view after a completion was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Current,
    Forecast,
    /// The request failed; its part of the view was blanked.
    Failed { kind: RequestKind, message: String },
}

/// Data currently on display.
#[derive(Debug, Clone, Default)]
pub struct View {
    pub city: Option<String>,
    pub units: Units,
    pub current: Option<CurrentConditions>,
    pub forecast: Vec<DailyForecastSummary>,
}

#[derive(Debug)]
pub struct Session {
    provider: Arc<dyn WeatherProvider>,
    units: Units,
    history: SearchHistory,
    favorites: Favorites,
    view: View,
    latest: Ticket,
    in_flight: usize,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        units: Units,
        history: SearchHistory,
        favorites: Favorites,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            provider,
            units,
            history,
            favorites,
            view: View {
                units,
                ..View::default()
            },
            latest: 0,
            in_flight: 0,
            tx,
            rx,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Units used by the next search. Data already on display is not converted.
    pub fn set_units(&mut self, units: Units) {
        self.units = units;
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    /// Flip favorite status of the displayed city; returns the new status.
    pub fn toggle_favorite(&mut self) -> Result<bool> {
        let Some(city) = self.view.city.clone() else {
            bail!("No city is displayed yet");
        };
        self.favorites.toggle(&city)
    }

    /// True when the latest search has no requests left in flight.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    /// Start fetching current weather and forecast for `city` in the background.
    ///
    /// Supersedes any earlier search: its completions are dropped when they arrive.
    pub fn search(&mut self, city: &str) -> Result<()> {
        let city = city.trim();
        if city.is_empty() {
            bail!("Please enter a city name");
        }

        self.history.record(city)?;

        self.latest += 1;
        let ticket = self.latest;
        self.in_flight = 2;
        self.view.city = Some(city.to_string());
        self.view.units = self.units;

        debug!(ticket, city, units = %self.units, "starting search");

        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let (name, units) = (city.to_string(), self.units);
        tokio::spawn(async move {
            let payload = Payload::Current(provider.current(&name, units).await);
            let _ = tx.send(Completion { ticket, payload });
        });

        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let (name, units) = (city.to_string(), self.units);
        tokio::spawn(async move {
            let payload = Payload::Forecast(provider.forecast(&name, units).await);
            let _ = tx.send(Completion { ticket, payload });
        });

        Ok(())
    }

    /// Wait for the next completion of the latest search and apply it to the view.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_update(&mut self) -> Option<Update> {
        while self.in_flight > 0 {
            // The session holds a sender, so the channel never closes.
            let completion = self.rx.recv().await?;

            if completion.ticket != self.latest {
                debug!(
                    ticket = completion.ticket,
                    latest = self.latest,
                    "dropping stale completion"
                );
                continue;
            }

            self.in_flight -= 1;
            return Some(self.apply(completion.payload));
        }

        None
    }

    fn apply(&mut self, payload: Payload) -> Update {
        match payload {
            Payload::Current(Ok(current)) => {
                self.view.current = Some(current);
                Update::Current
            }
            Payload::Forecast(Ok(days)) => {
                self.view.forecast = days;
                Update::Forecast
            }
            Payload::Current(Err(err)) => {
                self.view.current = None;
                Update::Failed {
                    kind: RequestKind::Current,
                    message: err.to_string(),
                }
            }
            Payload::Forecast(Err(err)) => {
                self.view.forecast.clear();
                Update::Failed {
                    kind: RequestKind::Forecast,
                    message: err.to_string(),
                }
            }
        }
    }
}
