//! Episode titles from epguides.com (with IMDb as a fallback), a local cache
//! of show details, and positional renaming of season folders.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod guide;
pub mod models;
pub mod refresh;
pub mod rename_engine;
pub mod show_index;
pub mod show_store;
