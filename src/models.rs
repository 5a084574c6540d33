use serde::{Deserialize, Serialize};

/// A show as listed in the guide's alphabetic index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowReference {
    pub name: String,
    pub url: String,
}

impl ShowReference {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Details shown for a single show; cached by name in the show store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShowDetails {
    pub name: String,
    pub start_date: String,
    pub run_time: String,
    pub synopsis: String,
    pub poster: Vec<u8>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub label: String,
    pub episodes: Vec<String>,
}

/// Formatted episode titles grouped by season, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonListing {
    seasons: Vec<Season>,
}

impl SeasonListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new, empty season. A label seen before is reset, matching a
    /// page that repeats a header.
    pub fn open_season(&mut self, label: &str) {
        if let Some(season) = self.seasons.iter_mut().find(|s| s.label == label) {
            season.episodes.clear();
        } else {
            self.seasons.push(Season {
                label: label.to_string(),
                episodes: Vec::new(),
            });
        }
    }

    /// Appends to an opened season. Returns false when the season was never
    /// opened.
    pub fn push_episode(&mut self, label: &str, title: String) -> bool {
        match self.seasons.iter_mut().find(|s| s.label == label) {
            Some(season) => {
                season.episodes.push(title);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.seasons
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.episodes.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Season> {
        self.seasons.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.seasons.iter().map(|s| s.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.seasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }

    /// Keeps only the ticked seasons, preserving page order.
    pub fn select(&self, labels: &[String]) -> SeasonListing {
        SeasonListing {
            seasons: self
                .seasons
                .iter()
                .filter(|s| labels.iter().any(|l| l == &s.label))
                .cloned()
                .collect(),
        }
    }

    /// Removes one episode (1-based position) from a season's selection.
    pub fn remove_episode(&mut self, label: &str, position: usize) -> Option<String> {
        let season = self.seasons.iter_mut().find(|s| s.label == label)?;
        if position == 0 || position > season.episodes.len() {
            return None;
        }
        Some(season.episodes.remove(position - 1))
    }
}

impl FromIterator<(String, Vec<String>)> for SeasonListing {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        SeasonListing {
            seasons: iter
                .into_iter()
                .map(|(label, episodes)| Season { label, episodes })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> SeasonListing {
        vec![
            ("Season 1".to_string(), vec!["01 - Pilot".to_string(), "02 - Two".to_string()]),
            ("Season 2".to_string(), vec!["01 - Back".to_string()]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_select_keeps_page_order() {
        let selected = listing().select(&["Season 2".to_string(), "Season 1".to_string()]);
        assert_eq!(selected.labels().collect::<Vec<_>>(), vec!["Season 1", "Season 2"]);

        let only_second = listing().select(&["Season 2".to_string()]);
        assert_eq!(only_second.len(), 1);
        assert_eq!(only_second.episode_count(), 1);
    }

    #[test]
    fn test_remove_episode() {
        let mut listing = listing();
        assert_eq!(listing.remove_episode("Season 1", 2), Some("02 - Two".to_string()));
        assert_eq!(listing.remove_episode("Season 1", 5), None);
        assert_eq!(listing.remove_episode("Season 1", 0), None);
        assert_eq!(listing.remove_episode("Season 9", 1), None);
        assert_eq!(listing.get("Season 1").unwrap(), ["01 - Pilot".to_string()]);
    }

    #[test]
    fn test_push_without_season_is_rejected() {
        let mut listing = SeasonListing::new();
        assert!(!listing.push_episode("Season 1", "01 - Lost".to_string()));
        listing.open_season("Season 1");
        assert!(listing.push_episode("Season 1", "01 - Found".to_string()));
        assert_eq!(listing.episode_count(), 1);
    }

    #[test]
    fn test_serializes_as_season_array() {
        let json = serde_json::to_string(&listing()).unwrap();
        assert!(json.starts_with(r#"[{"label":"Season 1""#));
    }
}
