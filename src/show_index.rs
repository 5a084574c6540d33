//! The local show index: show name -> guide page url, stored as JSON.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::models::ShowReference;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShowIndex {
    shows: BTreeMap<String, String>,
}

impl ShowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("TV shows file not found: {}", path.display());
                return Err(IndexError::Missing(path.to_path_buf()));
            }
            Err(source) => {
                return Err(IndexError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| {
            log::error!("Error decoding the TV shows file {}", path.display());
            IndexError::Malformed {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Overwrites `path` with the index, pretty-printed with a four space
    /// indent.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;

        fs::write(path, buf).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Saved {} shows to {}", self.len(), path.display());
        Ok(())
    }

    pub fn insert(&mut self, name: String, url: String) {
        self.shows.insert(name, url);
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shows.contains_key(name)
    }

    /// Exact lookup first, then a case-insensitive one.
    pub fn get(&self, name: &str) -> Option<ShowReference> {
        if let Some(url) = self.shows.get(name) {
            return Some(ShowReference::new(name, url.as_str()));
        }
        let lowered = name.to_lowercase();
        self.shows
            .iter()
            .find(|(show, _)| show.to_lowercase() == lowered)
            .map(|(show, url)| ShowReference::new(show.as_str(), url.as_str()))
    }

    /// Shows whose name contains `filter`, ignoring case, in name order.
    pub fn search(&self, filter: &str) -> Vec<ShowReference> {
        let filter = filter.to_lowercase();
        self.shows
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&filter))
            .map(|(name, url)| ShowReference::new(name.as_str(), url.as_str()))
            .collect()
    }
}

impl FromIterator<(String, String)> for ShowIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        ShowIndex {
            shows: iter.into_iter().collect(),
        }
    }
}
