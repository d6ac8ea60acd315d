use anyhow::Result;
use inquire::{CustomUserError, InquireError, Text};
use tracing::debug;

use weatherdesk_core::{Session, Update};

use crate::render;

const HELP: &str = "\
Type a city name to search.
  :fav        toggle favorite for the displayed city
  :units      switch between metric and imperial (re-runs the last search)
  :history    show recent searches
  :favorites  show favorite cities
  :help       show this message
  :quit       exit";

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Search(String),
    ToggleFavorite,
    SwitchUnits,
    History,
    Favorites,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }

        let Some(command) = line.strip_prefix(':') else {
            return Input::Search(line.to_string());
        };

        match command.to_lowercase().as_str() {
            "fav" | "favorite" => Input::ToggleFavorite,
            "units" | "u" => Input::SwitchUnits,
            "history" | "h" => Input::History,
            "favorites" | "favs" => Input::Favorites,
            "help" | "?" => Input::Help,
            "quit" | "q" | "exit" => Input::Quit,
            _ => Input::Unknown(line.to_string()),
        }
    }
}

/// Prompt loop: searches run in the background, results are rendered once both arrive.
pub async fn run(mut session: Session) -> Result<()> {
    println!("{HELP}\n");

    loop {
        let line = match prompt(&session) {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        match Input::parse(&line) {
            Input::Empty => eprintln!("Please enter a city name"),
            Input::Search(city) => search(&mut session, &city).await,
            Input::ToggleFavorite => match session.toggle_favorite() {
                Ok(true) => println!("Added to favorites."),
                Ok(false) => println!("Removed from favorites."),
                Err(err) => eprintln!("{err:#}"),
            },
            Input::SwitchUnits => {
                session.set_units(session.units().toggled());
                println!("Units: {}", session.units());
                if let Some(city) = session.view().city.clone() {
                    search(&mut session, &city).await;
                }
            }
            Input::History => print!(
                "{}",
                render::city_list(
                    "Recent searches",
                    session.history().entries().iter().map(String::as_str)
                )
            ),
            Input::Favorites => {
                print!("{}", render::city_list("Favorites", session.favorites().iter()))
            }
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
            Input::Unknown(cmd) => eprintln!("Unknown command {cmd}, try :help"),
        }
    }

    Ok(())
}

fn prompt(session: &Session) -> Result<String, InquireError> {
    let mut candidates: Vec<String> = session.history().entries().to_vec();
    for city in session.favorites().iter() {
        if !candidates.iter().any(|c| c == city) {
            candidates.push(city.to_string());
        }
    }

    Text::new("City:")
        .with_help_message(":help for commands")
        .with_autocomplete(suggestions(candidates))
        .prompt()
}

fn suggestions(
    candidates: Vec<String>,
) -> impl Fn(&str) -> Result<Vec<String>, CustomUserError> + Clone {
    move |input: &str| {
        let needle = input.trim().to_lowercase();
        Ok(candidates
            .iter()
            .filter(|c| !needle.is_empty() && c.to_lowercase().starts_with(&needle))
            .cloned()
            .collect())
    }
}

async fn search(session: &mut Session, city: &str) {
    if let Err(err) = session.search(city) {
        eprintln!("{err:#}");
        return;
    }

    while !session.is_idle() {
        let Some(update) = session.next_update().await else {
            break;
        };
        debug!(?update, "applied update");
        if let Update::Failed { kind, message } = update {
            eprintln!("Error fetching {}: {message}", kind.as_str());
        }
    }

    let view = session.view();
    match &view.current {
        Some(current) => {
            let favorite = view
                .city
                .as_deref()
                .is_some_and(|c| session.favorites().contains(c));
            print!("{}", render::current(current, view.units, favorite));
        }
        None => print!("{}", render::blank_current()),
    }
    println!("5-day forecast:");
    print!("{}", render::forecast(&view.forecast, view.units));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_search() {
        assert_eq!(Input::parse("  New York "), Input::Search("New York".into()));
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(Input::parse(":FAV"), Input::ToggleFavorite);
        assert_eq!(Input::parse(":units"), Input::SwitchUnits);
        assert_eq!(Input::parse(":q"), Input::Quit);
        assert_eq!(Input::parse(":favorites"), Input::Favorites);
    }

    #[test]
    fn blank_and_unknown_input() {
        assert_eq!(Input::parse("   "), Input::Empty);
        assert_eq!(Input::parse(":launch"), Input::Unknown(":launch".into()));
    }

    #[test]
    fn suggestions_match_prefix_ignoring_case() {
        let suggest = suggestions(vec!["London".into(), "Lisbon".into(), "Paris".into()]);

        assert_eq!(suggest("li").unwrap(), vec!["Lisbon".to_string()]);
        assert_eq!(suggest("L").unwrap().len(), 2);
        assert!(suggest("").unwrap().is_empty());
    }
}
