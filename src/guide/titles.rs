use anyhow::Result;
use regex::{Captures, Regex};

use crate::models::SeasonListing;

const INVALID_CHARACTERS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Rows starting with this word open a new season.
pub const SEASON_PREFIX: &str = "Season";

/// Strips characters that are not allowed in file names.
pub fn remove_invalid_characters(name: &str) -> String {
    name.chars()
        .filter(|c| !INVALID_CHARACTERS.contains(c))
        .collect()
}

/// Turns raw guide rows into `NN - Title` episode names.
#[derive(Debug, Clone)]
pub struct TitleFormatter {
    capitalize_pattern: Regex,
}

impl TitleFormatter {
    pub fn new() -> Result<Self> {
        // A lowercase letter after `.`, `+`, `(` or a space, whitespace allowed in between.
        // The whitespace is kept (`mr. smith` -> `Mr. Smith`); older guides glued
        // the words together instead.
        let capitalize_pattern = Regex::new(r"([.+( ])(\s*)([a-z])")?;
        Ok(Self { capitalize_pattern })
    }

    pub fn capitalize(&self, text: &str) -> String {
        self.capitalize_pattern
            .replace_all(text, |caps: &Captures| {
                format!("{}{}{}", &caps[1], &caps[2], caps[3].to_uppercase())
            })
            .into_owned()
    }

    pub fn format_episode(&self, ordinal: usize, title: &str) -> String {
        self.capitalize(&format!("{:02} - {}", ordinal, title))
    }

    /// Groups rows under the preceding season header and numbers each
    /// season's episodes from 01.
    pub fn organize_seasons(&self, rows: &[String]) -> SeasonListing {
        let mut listing = SeasonListing::new();
        let mut current: Option<&str> = None;
        let mut counter = 1;

        for row in rows {
            if row.starts_with(SEASON_PREFIX) {
                listing.open_season(row);
                current = Some(row);
                counter = 1;
                continue;
            }

            let Some(season) = current else {
                log::warn!("Dropping episode '{}' listed before any season header", row);
                continue;
            };
            listing.push_episode(season, self.format_episode(counter, row));
            counter += 1;
        }

        listing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_organize_seasons_example() {
        let formatter = TitleFormatter::new().unwrap();
        let listing = formatter.organize_seasons(&rows(&["Season 1", "pilot", "a new day"]));

        assert_eq!(listing.len(), 1);
        assert_eq!(
            listing.get("Season 1").unwrap(),
            ["01 - Pilot".to_string(), "02 - A New Day".to_string()]
        );
    }

    #[test]
    fn test_counter_restarts_each_season() {
        let formatter = TitleFormatter::new().unwrap();
        let listing = formatter.organize_seasons(&rows(&[
            "Season 1", "one", "two", "Season 2", "three",
        ]));

        assert_eq!(listing.labels().collect::<Vec<_>>(), vec!["Season 1", "Season 2"]);
        assert_eq!(listing.get("Season 2").unwrap(), ["01 - Three".to_string()]);
    }

    #[test]
    fn test_rows_before_first_season_are_dropped() {
        let formatter = TitleFormatter::new().unwrap();
        let listing = formatter.organize_seasons(&rows(&["orphan", "Season 1", "pilot"]));
        assert_eq!(listing.episode_count(), 1);
    }

    #[test]
    fn test_capitalize_after_punctuation() {
        let formatter = TitleFormatter::new().unwrap();
        assert_eq!(formatter.capitalize("mr. smith goes (to) town"), "mr. Smith Goes (To) Town");
        assert_eq!(formatter.capitalize("part.two+three"), "part.Two+Three");
        assert_eq!(formatter.capitalize("iPhone ok"), "iPhone Ok");
        assert_eq!(formatter.capitalize("x  spaced"), "x  Spaced");
        assert_eq!(formatter.format_episode(1, "a+  b"), "01 - A+  B");
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let formatter = TitleFormatter::new().unwrap();
        for title in ["pilot", "the (new) guy. again", "a+b c.d", "  leading"] {
            let once = formatter.format_episode(3, title);
            assert_eq!(formatter.capitalize(&once), once);
        }
    }

    #[test]
    fn test_remove_invalid_characters() {
        assert_eq!(remove_invalid_characters(r#"What? <Who>: "Me"/You\Us|*"#), "What Who MeYouUs");
        assert_eq!(remove_invalid_characters("Plain Title"), "Plain Title");
    }
}
