use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "tvshow-tagger",
    version,
    about = "Rename TV episode files using episode titles from epguides.com"
)]
pub struct Cli {
    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1, global = true)]
    pub log: u8,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download the show index from the guide site
    Refresh,
    /// List shows from the local index
    List {
        /// Only shows whose name contains this text (case-insensitive)
        filter: Option<String>,
    },
    /// Show start date, run time and synopsis of a show
    Info {
        show: String,
        /// Fetch again even if the details are cached
        #[arg(long)]
        refetch: bool,
        /// Write the poster image to this file
        #[arg(long)]
        poster: Option<PathBuf>,
    },
    /// Print the episode titles of a show, season by season
    Episodes {
        show: String,
        #[command(flatten)]
        selection: Selection,
    },
    /// Compare the selected seasons with the folders on disk
    Check {
        show: String,
        folder: PathBuf,
        #[command(flatten)]
        selection: Selection,
    },
    /// Rename the files of the selected seasons to their episode titles
    Rename {
        show: String,
        folder: PathBuf,
        #[command(flatten)]
        selection: Selection,
        /// Print the renames without touching any file
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct Selection {
    /// Season to include (e.g. 2, S02 or "Season 2"); repeatable, all seasons when omitted
    #[arg(short, long = "season")]
    pub seasons: Vec<String>,

    /// Episode to leave out of the selection, as SEASON:EPISODE (e.g. 1:3); repeatable
    #[arg(long = "drop")]
    pub drops: Vec<String>,
}
