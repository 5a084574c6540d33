//! Client for the episode guide site, with IMDb as a fallback source.
//!
//! Pages are downloaded asynchronously and handed as text to the parsers in
//! [`pages`] and [`imdb`], so no parsed document is held across an await.

pub mod imdb;
pub mod pages;
pub mod titles;

use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use reqwest::{Client, Response, StatusCode, header};
use url::Url;

use crate::config::Config;
use crate::error::GuideError;
use crate::models::{SeasonListing, ShowDetails, ShowReference};
use crate::show_index::ShowIndex;
use titles::TitleFormatter;

/// Letters of the alphabetic index pages (`menua` .. `menuy`).
pub const INDEX_PAGES: RangeInclusive<char> = 'a'..='y';

/// Conventional poster images on a show's guide page, tried in order.
pub const POSTER_ENDPOINTS: [&str; 2] = ["cast.jpg", "logo.jpg"];

pub const NO_SYNOPSIS: &str = "No synopsis available on Epguides or IMDB.";

#[derive(Debug, Clone)]
pub struct EpisodeGuide {
    client: Client,
    guide_url: Url,
    imdb_url: Url,
    user_agent: String,
    titles: TitleFormatter,
    line_break: Regex,
}

fn base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).with_context(|| format!("invalid base url '{}'", raw))
}

impl EpisodeGuide {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            guide_url: base_url(&config.guide_url)?,
            imdb_url: base_url(&config.imdb_url)?,
            user_agent: config.user_agent.clone(),
            titles: TitleFormatter::new()?,
            line_break: Regex::new(r"(?i)<br\s*/?>")?,
        })
    }

    /// GETs `url`, logging any status other than 200. `browser` adds the
    /// desktop User-Agent that IMDb expects.
    async fn get(&self, url: &str, browser: bool) -> Result<Response> {
        let mut request = self.client.get(url);
        if browser {
            request = request.header(header::USER_AGENT, self.user_agent.as_str());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if response.status() != StatusCode::OK {
            warn!(
                "Failed to fetch data from {}. Status code: {}.",
                url,
                response.status()
            );
        }
        Ok(response)
    }

    async fn get_text(&self, url: &str, browser: bool) -> Result<String> {
        let response = self.get(url, browser).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GuideError::Status {
                url: url.to_string(),
                status,
            }
            .into());
        }
        Ok(response.text().await?)
    }

    /// Collects every show of the alphabetic index. Pages that do not answer
    /// 200 are skipped; transport failures abort.
    pub async fn list_shows(&self) -> Result<ShowIndex> {
        info!("Starting the update process.");
        let mut index = ShowIndex::new();

        for letter in INDEX_PAGES {
            let page_url = self.guide_url.join(&format!("menu{}", letter))?;
            let response = self.get(page_url.as_str(), false).await?;
            if response.status() != StatusCode::OK {
                continue;
            }

            let body = response.text().await?;
            match pages::parse_index_page(&body, &page_url)? {
                Some(shows) => {
                    debug!("{} shows on {}", shows.len(), page_url);
                    for show in shows {
                        index.insert(show.name, show.url);
                    }
                }
                None => warn!("No show list found on {}", page_url),
            }
        }

        info!("Finished updating shows.");
        Ok(index)
    }

    /// Fetches the whole index and overwrites the listing file at `path`.
    pub async fn refresh_index(&self, path: &Path) -> Result<ShowIndex> {
        let index = self.list_shows().await?;
        index.save(path)?;
        Ok(index)
    }

    pub async fn list_episodes(&self, url: &str) -> Result<SeasonListing> {
        info!("Fetching episode names for the show with URL: {}.", url);
        let body = self.get_text(url, false).await?;
        let rows = pages::parse_episode_rows(&body, url)?;
        Ok(self.titles.organize_seasons(&rows))
    }

    pub async fn fetch_details(&self, show: &ShowReference) -> Result<ShowDetails> {
        info!("Fetching details for show: {}.", show.name);
        let body = self.get_text(&show.url, false).await?;
        let page = pages::parse_show_page(&body, &self.line_break)?;

        // Kept so the poster fallback does not download the title page twice.
        let mut imdb_title_page = None;

        let synopsis = if page.synopsis.is_empty() {
            info!("Using IMDB as a fallback for the synopsis of {}.", show.name);
            let title_page = self.imdb_title_page(show, page.imdb_url.as_deref()).await?;
            let plot = imdb::parse_plot(&title_page)?;
            imdb_title_page = Some(title_page);
            plot.unwrap_or_else(|| NO_SYNOPSIS.to_string())
        } else {
            page.synopsis
        };

        let poster = self
            .fetch_poster(show, page.imdb_url.as_deref(), imdb_title_page)
            .await?;

        Ok(ShowDetails {
            name: show.name.clone(),
            start_date: page.start_date,
            run_time: page.run_time,
            synopsis,
            poster,
            url: show.url.clone(),
        })
    }

    async fn imdb_title_page(&self, show: &ShowReference, link: Option<&str>) -> Result<String> {
        let link = link.ok_or_else(|| GuideError::MissingElement {
            page: show.url.clone(),
            element: "IMDb title link",
        })?;
        self.get_text(link, true).await
    }

    async fn fetch_poster(
        &self,
        show: &ShowReference,
        imdb_link: Option<&str>,
        imdb_title_page: Option<String>,
    ) -> Result<Vec<u8>> {
        let show_root = show.url.trim_end_matches('/');
        for endpoint in POSTER_ENDPOINTS {
            let response = self.get(&format!("{}/{}", show_root, endpoint), false).await?;
            if response.status() == StatusCode::OK {
                return Ok(response.bytes().await?.to_vec());
            }
        }

        info!("Using IMDB as a fallback for the poster of {}.", show.name);
        let title_page = match imdb_title_page {
            Some(page) => page,
            None => self.imdb_title_page(show, imdb_link).await?,
        };

        let viewer_link =
            imdb::parse_media_viewer_link(&title_page)?.ok_or_else(|| GuideError::MissingElement {
                page: imdb_link.unwrap_or(show.url.as_str()).to_string(),
                element: "poster media viewer link",
            })?;
        let viewer_url = self.imdb_url.join(&viewer_link)?;
        let viewer_page = self.get_text(viewer_url.as_str(), true).await?;

        let image_url =
            imdb::parse_poster_image(&viewer_page)?.ok_or_else(|| GuideError::MissingElement {
                page: viewer_url.to_string(),
                element: "poster image",
            })?;
        let image_url = self.imdb_url.join(&image_url)?;
        let response = self.get(image_url.as_str(), false).await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}
