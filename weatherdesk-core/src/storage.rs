//! Search history and favorites, each kept as one city name per line.
//!
//! Both collections are read whole at startup and rewritten whole after every
//! mutation. There is no locking: a single process is expected to own the files.

use anyhow::{Context, Result};
use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::info;

pub const HISTORY_FILE: &str = "search_history.txt";
pub const FAVORITES_FILE: &str = "favorites.txt";

/// Maximum number of remembered searches.
pub const HISTORY_LIMIT: usize = 10;

/// Most-recent-first list of searched city names, without duplicates.
#[derive(Debug, Clone)]
pub struct SearchHistory {
    path: PathBuf,
    entries: Vec<String>,
}

impl SearchHistory {
    /// Read the history file; a missing file means an empty history.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut entries = Vec::new();

        for city in read_lines(&path)? {
            if !entries.contains(&city) && entries.len() < HISTORY_LIMIT {
                entries.push(city);
            }
        }

        Ok(Self { path, entries })
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Put `city` at the front, dropping an older copy and anything past the limit.
    /// Blank names are ignored.
    pub fn record(&mut self, city: &str) -> Result<()> {
        let city = city.trim();
        if city.is_empty() {
            return Ok(());
        }

        self.entries.retain(|c| c != city);
        self.entries.insert(0, city.to_string());
        self.entries.truncate(HISTORY_LIMIT);

        self.save()
    }

    /// Remove `city`; returns whether it was present.
    pub fn remove(&mut self, city: &str) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|c| c != city.trim());

        if self.entries.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }

    fn save(&self) -> Result<()> {
        write_lines(&self.path, self.entries.iter())
    }
}

/// Set of favorite city names.
#[derive(Debug, Clone)]
pub struct Favorites {
    path: PathBuf,
    cities: BTreeSet<String>,
}

impl Favorites {
    /// Read the favorites file; a missing file means no favorites.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cities = read_lines(&path)?.into_iter().collect();

        Ok(Self { path, cities })
    }

    pub fn contains(&self, city: &str) -> bool {
        self.cities.contains(city.trim())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Add `city`; returns false if it was already a favorite.
    pub fn add(&mut self, city: &str) -> Result<bool> {
        let city = city.trim();
        if city.is_empty() || !self.cities.insert(city.to_string()) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Remove `city`; returns false if it was not a favorite.
    pub fn remove(&mut self, city: &str) -> Result<bool> {
        if !self.cities.remove(city.trim()) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Flip favorite status; returns whether `city` is a favorite afterwards.
    pub fn toggle(&mut self, city: &str) -> Result<bool> {
        if self.contains(city) {
            self.remove(city)?;
            Ok(false)
        } else {
            self.add(city)
        }
    }

    fn save(&self) -> Result<()> {
        write_lines(&self.path, self.cities.iter())
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn write_lines<'a>(path: &Path, lines: impl Iterator<Item = &'a String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut contents = String::new();
    for line in lines {
        contents.push_str(line);
        contents.push('\n');
    }

    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "saved city list");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        env,
        sync::atomic::{AtomicUsize, Ordering},
    };

    fn scratch_dir() -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        env::temp_dir().join(format!("weatherdesk-storage-{}-{n}", std::process::id()))
    }

    #[test]
    fn history_moves_existing_city_to_front() {
        let dir = scratch_dir();
        let mut history = SearchHistory::load(dir.join(HISTORY_FILE)).unwrap();

        history.record("London").unwrap();
        history.record("Paris").unwrap();
        history.record("London").unwrap();

        assert_eq!(history.entries(), ["London", "Paris"]);
    }

    #[test]
    fn history_never_exceeds_limit() {
        let dir = scratch_dir();
        let mut history = SearchHistory::load(dir.join(HISTORY_FILE)).unwrap();

        for i in 0..15 {
            history.record(&format!("City {i}")).unwrap();
        }

        assert_eq!(history.entries().len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0], "City 14");
        assert_eq!(history.entries()[9], "City 5");
    }

    #[test]
    fn history_ignores_blank_names() {
        let dir = scratch_dir();
        let path = dir.join(HISTORY_FILE);
        let mut history = SearchHistory::load(&path).unwrap();

        history.record("   ").unwrap();

        assert!(history.entries().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn history_is_rewritten_and_reloaded() {
        let dir = scratch_dir();
        let path = dir.join(HISTORY_FILE);
        let mut history = SearchHistory::load(&path).unwrap();

        history.record("Oslo").unwrap();
        history.record("Bergen").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Bergen\nOslo\n");

        let reloaded = SearchHistory::load(&path).unwrap();
        assert_eq!(reloaded.entries(), ["Bergen", "Oslo"]);

        let mut reloaded = reloaded;
        assert!(reloaded.remove("Oslo").unwrap());
        assert!(!reloaded.remove("Oslo").unwrap());
        reloaded.clear().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn history_load_drops_duplicates_and_blank_lines() {
        let dir = scratch_dir();
        let path = dir.join(HISTORY_FILE);
        fs::create_dir_all(&dir).unwrap();
        fs::write(&path, "Rome\n\nRome\nMilan\n").unwrap();

        let history = SearchHistory::load(&path).unwrap();

        assert_eq!(history.entries(), ["Rome", "Milan"]);
    }

    #[test]
    fn favorites_add_is_idempotent() {
        let dir = scratch_dir();
        let mut favorites = Favorites::load(dir.join(FAVORITES_FILE)).unwrap();

        assert!(favorites.add("Tokyo").unwrap());
        assert!(!favorites.add("Tokyo").unwrap());

        assert_eq!(favorites.len(), 1);
        assert!(favorites.contains("Tokyo"));
    }

    #[test]
    fn favorites_add_then_remove_leaves_nothing() {
        let dir = scratch_dir();
        let path = dir.join(FAVORITES_FILE);
        let mut favorites = Favorites::load(&path).unwrap();

        favorites.add("Lima").unwrap();
        favorites.remove("Lima").unwrap();

        assert!(favorites.is_empty());
        assert!(Favorites::load(&path).unwrap().is_empty());
    }

    #[test]
    fn favorites_toggle_flips_and_persists() {
        let dir = scratch_dir();
        let path = dir.join(FAVORITES_FILE);
        let mut favorites = Favorites::load(&path).unwrap();

        assert!(favorites.toggle("Cairo").unwrap());
        assert!(favorites.toggle("Accra").unwrap());
        assert!(!favorites.toggle("Cairo").unwrap());

        let reloaded = Favorites::load(&path).unwrap();
        assert_eq!(reloaded.iter().collect::<Vec<_>>(), ["Accra"]);
    }
}
