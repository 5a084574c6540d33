use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::guide::titles::SEASON_PREFIX;
use crate::models::SeasonListing;

#[derive(Debug, Clone)]
pub struct RenameConfig {
    pub directory: PathBuf,
    pub alternate_season_word: String,
    pub extension: String,
}

/// A file paired with the episode title it will be renamed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRename {
    pub original_path: PathBuf,
    pub new_path: PathBuf,
    pub season: String,
    pub episode_title: String,
}

impl FileRename {
    pub fn original_name(&self) -> String {
        file_name(&self.original_path)
    }

    pub fn new_name(&self) -> String {
        file_name(&self.new_path)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameStatus {
    Renamed,
    /// The file already had its target name.
    Unchanged,
    SourceNotFound,
    AlreadyExists,
    OtherError(String),
}

#[derive(Debug, Clone)]
pub struct RenameResult {
    pub file_rename: FileRename,
    pub status: RenameStatus,
}

impl RenameResult {
    pub fn success(&self) -> bool {
        matches!(self.status, RenameStatus::Renamed | RenameStatus::Unchanged)
    }
}

/// A disagreement between the selected seasons and the folder on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureWarning {
    MissingSeason {
        season: String,
    },
    CountMismatch {
        season: String,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for StructureWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureWarning::MissingSeason { season } => write!(f, "Missing {}.", season),
            StructureWarning::CountMismatch {
                season,
                expected,
                found,
            } => write!(
                f,
                "Number of files in '{}' folder ({}) does not match the number of episodes in the overview ({}).",
                season, found, expected
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RenamePlan {
    /// At least one season does not match; nothing may be renamed.
    Blocked(Vec<StructureWarning>),
    Ready(Vec<FileRename>),
}

#[derive(Debug, Clone)]
pub enum RenameOutcome {
    Aborted(Vec<StructureWarning>),
    Completed(Vec<RenameResult>),
}

#[derive(Debug)]
pub struct RenameEngine {
    config: RenameConfig,
}

impl RenameEngine {
    pub fn new(config: RenameConfig) -> Self {
        Self { config }
    }

    /// The folder holding a season: `Season N` first, then the localized
    /// spelling (`Saison N`).
    pub fn season_folder(&self, season: &str) -> Option<PathBuf> {
        let primary = self.config.directory.join(season);
        if primary.is_dir() {
            return Some(primary);
        }

        let alternate = self
            .config
            .directory
            .join(season.replace(SEASON_PREFIX, &self.config.alternate_season_word));
        alternate.is_dir().then_some(alternate)
    }

    /// Plain files of a season folder, sorted by name with digit runs
    /// compared as numbers (`E2` before `E10`).
    pub fn scan_season(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(folder)
            .with_context(|| format!("failed to list {}", folder.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)).then_with(|| a.cmp(b)));
        Ok(files)
    }

    /// Compares every season of `listing` with the folder on disk. Never
    /// touches a file.
    pub fn check_structure(&self, listing: &SeasonListing) -> Result<Vec<StructureWarning>> {
        let mut warnings = Vec::new();

        for season in listing.iter() {
            let Some(folder) = self.season_folder(&season.label) else {
                warnings.push(StructureWarning::MissingSeason {
                    season: season.label.clone(),
                });
                continue;
            };

            let found = self.scan_season(&folder)?.len();
            if found != season.episodes.len() {
                warnings.push(StructureWarning::CountMismatch {
                    season: season.label.clone(),
                    expected: season.episodes.len(),
                    found,
                });
            }
        }

        if warnings.is_empty() {
            log::info!("File structure matches the expected structure.");
        } else {
            log::warn!("Discrepancies found in file structures.");
        }
        Ok(warnings)
    }

    /// Pairs files and titles by position, season by season.
    pub fn plan_renames(&self, listing: &SeasonListing) -> Result<RenamePlan> {
        let warnings = self.check_structure(listing)?;
        if !warnings.is_empty() {
            return Ok(RenamePlan::Blocked(warnings));
        }

        let mut renames = Vec::new();
        for season in listing.iter() {
            let Some(folder) = self.season_folder(&season.label) else {
                continue;
            };
            let files = self.scan_season(&folder)?;

            for (original_path, title) in files.into_iter().zip(&season.episodes) {
                let new_path = folder.join(format!("{}.{}", title, self.config.extension));
                renames.push(FileRename {
                    original_path,
                    new_path,
                    season: season.label.clone(),
                    episode_title: title.clone(),
                });
            }
        }

        Ok(RenamePlan::Ready(renames))
    }

    /// Renames every file of the selected seasons, or nothing at all when
    /// any season fails the structure check.
    pub fn rename_files(&self, listing: &SeasonListing) -> Result<RenameOutcome> {
        match self.plan_renames(listing)? {
            RenamePlan::Blocked(warnings) => Ok(RenameOutcome::Aborted(warnings)),
            RenamePlan::Ready(renames) => Ok(RenameOutcome::Completed(self.execute(&renames))),
        }
    }

    /// Best effort: a failed file is logged and the rest still run.
    pub fn execute(&self, renames: &[FileRename]) -> Vec<RenameResult> {
        renames.iter().map(|rename| self.rename_file(rename)).collect()
    }

    pub fn rename_file(&self, file_rename: &FileRename) -> RenameResult {
        let status = rename_path(&file_rename.original_path, &file_rename.new_path);
        match &status {
            RenameStatus::Renamed => log::info!(
                "Renamed: {} to {}",
                file_rename.original_path.display(),
                file_rename.new_path.display()
            ),
            RenameStatus::Unchanged => {
                log::debug!("No changes needed for {}", file_rename.original_name())
            }
            RenameStatus::SourceNotFound => {
                log::error!("File not found: {}", file_rename.original_path.display())
            }
            RenameStatus::AlreadyExists => {
                log::error!("File already exists: {}", file_rename.new_path.display())
            }
            RenameStatus::OtherError(msg) => {
                log::error!("An error occurred while renaming: {}", msg)
            }
        }

        RenameResult {
            file_rename: file_rename.clone(),
            status,
        }
    }
}

fn rename_path(from: &Path, to: &Path) -> RenameStatus {
    if from == to {
        return RenameStatus::Unchanged;
    }
    if !from.exists() {
        return RenameStatus::SourceNotFound;
    }
    // `fs::rename` replaces an existing target on Unix.
    if to.exists() {
        return RenameStatus::AlreadyExists;
    }

    match fs::rename(from, to) {
        Ok(()) => RenameStatus::Renamed,
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => RenameStatus::SourceNotFound,
            io::ErrorKind::AlreadyExists => RenameStatus::AlreadyExists,
            _ => RenameStatus::OtherError(e.to_string()),
        },
    }
}

/// Orders names like a person would: runs of digits compare by value.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = digit_run(&mut a);
                let right = digit_run(&mut b);
                let ordering = left
                    .len()
                    .cmp(&right.len())
                    .then_with(|| left.cmp(&right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

/// Consumes a run of ASCII digits, without its leading zeros.
fn digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        if !(run.is_empty() && c == '0') {
            run.push(c);
        }
    }
    run
}

static SEASON_SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:s|season\s*|saison\s*)?(\d{1,3})\s*$")
        .expect("season selector pattern is valid")
});

/// Reads a season number from `3`, `S03`, `s3`, `Season 3` or `Saison 3`.
pub fn season_number(selector: &str) -> Option<u32> {
    SEASON_SELECTOR.captures(selector)?.get(1)?.as_str().parse().ok()
}

/// The listing label used for a season number.
pub fn season_label(number: u32) -> String {
    format!("{} {}", SEASON_PREFIX, number)
}

pub struct ConfigBuilder {
    directory: Option<PathBuf>,
    alternate_season_word: String,
    extension: String,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            directory: None,
            alternate_season_word: "Saison".to_string(),
            extension: "mkv".to_string(),
        }
    }

    pub fn directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.directory = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn alternate_season_word(mut self, word: &str) -> Self {
        self.alternate_season_word = word.to_string();
        self
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn build(self) -> Result<RenameConfig> {
        let directory = self
            .directory
            .ok_or_else(|| anyhow::anyhow!("Directory is required"))?;

        if !directory.is_dir() {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {}",
                directory.display()
            ));
        }
        if self.extension.is_empty() {
            return Err(anyhow::anyhow!("Extension must not be empty"));
        }

        Ok(RenameConfig {
            directory,
            alternate_season_word: self.alternate_season_word,
            extension: self.extension,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
