use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::cli::{Cli, Command, Selection};
use crate::config::Config;
use crate::guide::EpisodeGuide;
use crate::models::{SeasonListing, ShowDetails, ShowReference};
use crate::refresh::{RefreshEvent, spawn_refresh};
use crate::rename_engine::{
    ConfigBuilder, RenameEngine, RenameOutcome, RenamePlan, RenameResult, RenameStatus,
    StructureWarning, season_label, season_number,
};
use crate::show_index::ShowIndex;
use crate::show_store::ShowStore;

pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    log::debug!("Data directory: {}", config.data_dir().display());

    match cli.command {
        Command::Refresh => refresh(&config).await,
        Command::List { filter } => list(&config, filter.as_deref()),
        Command::Info {
            show,
            refetch,
            poster,
        } => info(&config, &show, refetch, poster.as_deref()).await,
        Command::Episodes { show, selection } => episodes(&config, &show, &selection).await,
        Command::Check {
            show,
            folder,
            selection,
        } => check(&config, &show, &folder, &selection).await,
        Command::Rename {
            show,
            folder,
            selection,
            dry_run,
        } => rename(&config, &show, &folder, &selection, dry_run).await,
    }
}

async fn refresh(config: &Config) -> Result<()> {
    let index_path = config.index_path();
    let guide = Arc::new(EpisodeGuide::new(config)?);

    log::info!("Starting TV shows update...");
    let (handle, events) = spawn_refresh(guide, index_path.clone());
    println!("Updating the show list, please wait...");

    let event = events
        .await
        .context("the refresh task stopped without reporting")?;
    handle.await.context("the refresh task panicked")?;

    match event {
        RefreshEvent::Finished(count) => {
            let index = ShowIndex::load(&index_path)?;
            println!("✓ {} shows saved to {}", count, index_path.display());
            log::debug!("Reloaded {} shows", index.len());
            Ok(())
        }
        RefreshEvent::Failed(message) => bail!("Unable to update shows: {}", message),
    }
}

fn list(config: &Config, filter: Option<&str>) -> Result<()> {
    let index = ShowIndex::load(&config.index_path())?;
    let shows = index.search(filter.unwrap_or(""));
    if shows.is_empty() {
        println!("No series found. Please refresh list.");
        return Ok(());
    }
    for show in shows {
        println!("{}", show.name);
    }
    Ok(())
}

fn find_show(config: &Config, name: &str) -> Result<ShowReference> {
    let index = ShowIndex::load(&config.index_path())?;
    if let Some(show) = index.get(name) {
        return Ok(show);
    }

    let suggestions: Vec<String> = index
        .search(name)
        .into_iter()
        .take(5)
        .map(|show| show.name)
        .collect();
    if suggestions.is_empty() {
        bail!("No show named '{}' in the index", name);
    }
    bail!(
        "No show named '{}' in the index. Did you mean: {}?",
        name,
        suggestions.join(", ")
    )
}

/// Cached details for `show`, fetching and caching them on a miss or when
/// `refetch` is set.
pub async fn details_for(
    store: &ShowStore,
    guide: &EpisodeGuide,
    show: &ShowReference,
    refetch: bool,
) -> Result<ShowDetails> {
    if !refetch {
        if let Some(details) = store.select(show)? {
            log::debug!("Details for {} served from the cache", show.name);
            return Ok(details);
        }
    }

    let details = guide.fetch_details(show).await?;
    store.insert(&details)?;
    Ok(details)
}

async fn info(config: &Config, name: &str, refetch: bool, poster: Option<&Path>) -> Result<()> {
    let show = find_show(config, name)?;
    let store = ShowStore::open(&config.database_path())?;
    let guide = EpisodeGuide::new(config)?;
    let details = details_for(&store, &guide, &show, refetch).await?;

    println!("{}", details.name);
    println!("{}", "=".repeat(details.name.chars().count()));
    println!("Start date: {}", details.start_date);
    println!("Run time:   {}", details.run_time);
    println!("Link:       {}", details.url);
    println!();
    println!("{}", details.synopsis);

    if let Some(path) = poster {
        fs::write(path, &details.poster)
            .with_context(|| format!("failed to write poster to {}", path.display()))?;
        println!("\nPoster ({} bytes) written to {}", details.poster.len(), path.display());
    }
    Ok(())
}

/// Applies season ticks and dropped episodes to a fetched listing.
pub fn apply_selection(listing: &SeasonListing, selection: &Selection) -> Result<SeasonListing> {
    let mut selected = if selection.seasons.is_empty() {
        listing.clone()
    } else {
        let mut labels = Vec::new();
        for selector in &selection.seasons {
            let number = season_number(selector)
                .with_context(|| format!("invalid season '{}'", selector))?;
            let label = season_label(number);
            if listing.get(&label).is_none() {
                bail!("{} is not listed for this show", label);
            }
            labels.push(label);
        }
        listing.select(&labels)
    };

    // Positions refer to the fetched numbering, so drop from the back.
    let mut drops: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for drop in &selection.drops {
        let (season, episode) = drop
            .split_once(':')
            .with_context(|| format!("invalid episode '{}', expected SEASON:EPISODE", drop))?;
        let number = season_number(season)
            .with_context(|| format!("invalid season in '{}'", drop))?;
        let position: usize = episode
            .trim()
            .parse()
            .with_context(|| format!("invalid episode number in '{}'", drop))?;
        drops.entry(season_label(number)).or_default().push(position);
    }

    for (label, mut positions) in drops {
        positions.sort_unstable_by(|a, b| b.cmp(a));
        positions.dedup();
        for position in positions {
            match selected.remove_episode(&label, position) {
                Some(title) => log::info!("Left out {}: {}", label, title),
                None => bail!("{} has no episode {} in the selection", label, position),
            }
        }
    }

    Ok(selected)
}

async fn selected_listing(
    config: &Config,
    name: &str,
    selection: &Selection,
) -> Result<(ShowReference, SeasonListing)> {
    let show = find_show(config, name)?;
    let guide = EpisodeGuide::new(config)?;
    let listing = guide.list_episodes(&show.url).await?;
    log::info!("Retrieved {} seasons for series: {}", listing.len(), show.name);
    let selected = apply_selection(&listing, selection)?;
    Ok((show, selected))
}

fn engine_for(config: &Config, folder: &Path) -> Result<RenameEngine> {
    let rename_config = ConfigBuilder::new()
        .directory(folder)
        .alternate_season_word(&config.alternate_season_word)
        .extension(&config.extension)
        .build()?;
    Ok(RenameEngine::new(rename_config))
}

async fn episodes(config: &Config, name: &str, selection: &Selection) -> Result<()> {
    let (show, listing) = selected_listing(config, name, selection).await?;

    println!("{}", show.name);
    println!("Number of seasons available: {} ({})", listing.len(), show.url);
    for season in listing.iter() {
        println!("\n{}", season.label);
        for episode in &season.episodes {
            println!("  {}", episode);
        }
    }
    Ok(())
}

async fn check(config: &Config, name: &str, folder: &Path, selection: &Selection) -> Result<()> {
    let (_, listing) = selected_listing(config, name, selection).await?;
    let engine = engine_for(config, folder)?;

    let warnings = engine.check_structure(&listing)?;
    if warnings.is_empty() {
        println!("✓ File structure matches the {} selected season(s).", listing.len());
        return Ok(());
    }

    for warning in &warnings {
        println!("⚠ Warning: {}", warning);
    }
    bail!("{} discrepancies found in {}", warnings.len(), folder.display())
}

async fn rename(
    config: &Config,
    name: &str,
    folder: &Path,
    selection: &Selection,
    dry_run: bool,
) -> Result<()> {
    let (_, listing) = selected_listing(config, name, selection).await?;
    let engine = engine_for(config, folder)?;

    if dry_run {
        return match engine.plan_renames(&listing)? {
            RenamePlan::Blocked(warnings) => report_blocked(&warnings),
            RenamePlan::Ready(renames) => {
                for rename in &renames {
                    println!(
                        "[{}] {} -> {}",
                        rename.season,
                        rename.original_name(),
                        rename.new_name()
                    );
                }
                println!("\n{} file(s) would be renamed.", renames.len());
                Ok(())
            }
        };
    }

    match engine.rename_files(&listing)? {
        RenameOutcome::Aborted(warnings) => report_blocked(&warnings),
        RenameOutcome::Completed(results) => {
            print_summary(&results);
            Ok(())
        }
    }
}

fn report_blocked(warnings: &[StructureWarning]) -> Result<()> {
    for warning in warnings {
        println!("⚠ Warning: {}", warning);
    }
    bail!("Nothing was renamed: the folders do not match the selected seasons")
}

fn print_summary(results: &[RenameResult]) {
    for result in results {
        let rename = &result.file_rename;
        match &result.status {
            RenameStatus::Renamed => {
                println!("✓ {} -> {}", rename.original_name(), rename.new_name())
            }
            RenameStatus::Unchanged => println!("ℹ No changes needed for: {}", rename.new_name()),
            RenameStatus::SourceNotFound => {
                println!("✗ Error: Source file '{}' not found!", rename.original_name())
            }
            RenameStatus::AlreadyExists => {
                println!("✗ Error: Target file '{}' already exists!", rename.new_name())
            }
            RenameStatus::OtherError(msg) => {
                println!("✗ Error renaming '{}': {}", rename.original_name(), msg)
            }
        }
    }

    let success_count = results.iter().filter(|r| r.success()).count();
    let total_count = results.len();
    println!("===================");
    println!(
        "Summary: {} of {} files processed successfully",
        success_count, total_count
    );

    if success_count == total_count && total_count > 0 {
        println!("✓ All files renamed successfully!");
    } else if success_count > 0 {
        println!("⚠ Some files were renamed, but there were errors with others.");
    } else {
        println!("✗ No files were renamed.");
    }
}
