//! User configuration, read from a TOML file.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "tvshow-tagger";
const INDEX_FILE: &str = "tv_shows_list.json";
const DATABASE_FILE: &str = "shows.db";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/81.0.4044.138 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the episode guide site
    #[serde(default = "default_guide_url")]
    pub guide_url: String,

    /// Root of the fallback review site
    #[serde(default = "default_imdb_url")]
    pub imdb_url: String,

    /// User-Agent sent to the fallback review site
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Where the show index and the details cache live
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Localized word tried when a "Season N" folder is missing
    #[serde(default = "default_alternate_season_word")]
    pub alternate_season_word: String,

    /// Extension given to renamed files
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn default_guide_url() -> String {
    "https://epguides.com/".to_string()
}

fn default_imdb_url() -> String {
    "https://www.imdb.com/".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_alternate_season_word() -> String {
    "Saison".to_string()
}

fn default_extension() -> String {
    "mkv".to_string()
}

impl Config {
    pub fn new() -> Self {
        Self {
            guide_url: default_guide_url(),
            imdb_url: default_imdb_url(),
            user_agent: default_user_agent(),
            data_dir: None,
            alternate_season_word: default_alternate_season_word(),
            extension: default_extension(),
        }
    }

    /// `~/.config/tvshow-tagger/config.toml` on Linux, or the platform
    /// equivalent.
    pub fn default_path() -> Result<PathBuf, io::Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
        })?;
        Ok(config_dir.join(APP_DIR).join("config.toml"))
    }

    /// Loads the config at `path`, or the default location when `None`.
    /// A file that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                // No platform data dir (e.g. `$HOME` unset): use the working directory.
                .unwrap_or_default()
        })
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir().join(INDEX_FILE)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(DATABASE_FILE)
    }
}
