//! Extraction from epguides.com pages. The site has no schema; every lookup
//! here is by class name and position.

use anyhow::{Result, anyhow};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::titles::{SEASON_PREFIX, remove_invalid_characters};
use crate::error::GuideError;
use crate::models::ShowReference;

/// Index entries with this suffix are radio shows.
const RADIO_SUFFIX: &str = " [radio]";

/// The first two rows of the episode table are headers.
const EPISODE_TABLE_HEADER_ROWS: usize = 2;

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector '{}': {}", css, e))
}

pub(crate) fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Show links of one alphabetic index page, hrefs resolved against
/// `page_url`. `None` when the page has no show list at all.
pub fn parse_index_page(html: &str, page_url: &Url) -> Result<Option<Vec<ShowReference>>> {
    let document = Html::parse_document(html);
    let container_selector = selector("div.cont")?;
    let item_selector = selector("li")?;
    let link_selector = selector("a")?;

    let Some(container) = document.select(&container_selector).next() else {
        return Ok(None);
    };

    let mut shows = Vec::new();
    for item in container.select(&item_selector) {
        let text = element_text(&item);
        if text.is_empty() || text.ends_with(RADIO_SUFFIX) {
            continue;
        }

        let Some(link) = item.select(&link_selector).next() else {
            log::debug!("Index entry without a link: {}", text);
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        match page_url.join(href) {
            Ok(url) => shows.push(ShowReference::new(element_text(&link), url.to_string())),
            Err(e) => log::warn!("Skipping '{}' with unusable link '{}': {}", text, href, e),
        }
    }

    Ok(Some(shows))
}

/// Season headers and episode titles of a show page, in page order, with
/// invalid file name characters already stripped.
pub fn parse_episode_rows(html: &str, page_url: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let table_selector = selector("#eplist table")?;
    let row_selector = selector("tr")?;
    let season_selector = selector("td.bold")?;
    let title_selector = selector("td.eptitle a")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| GuideError::MissingElement {
            page: page_url.to_string(),
            element: "episode list table",
        })?;

    let mut rows = Vec::new();
    for row in table.select(&row_selector).skip(EPISODE_TABLE_HEADER_ROWS) {
        if let Some(season) = row.select(&season_selector).next() {
            let season = remove_invalid_characters(&element_text(&season));
            if season.starts_with(SEASON_PREFIX) {
                rows.push(season);
            } else {
                log::debug!("Ignoring non-season header '{}'", season);
            }
        }

        if let Some(title) = row.select(&title_selector).next() {
            rows.push(remove_invalid_characters(&element_text(&title)));
        }
    }

    Ok(rows)
}

/// What a show's main page yields before any fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowPage {
    pub start_date: String,
    pub run_time: String,
    pub synopsis: String,
    pub imdb_url: Option<String>,
}

pub fn parse_show_page(html: &str, line_break: &Regex) -> Result<ShowPage> {
    let document = Html::parse_document(html);
    let columns_selector = selector(".half.column")?;
    let pads_selector = selector(".pads")?;
    let link_selector = selector("a")?;
    let blurb_selector = selector("#blurb")?;
    let imdb_selector = selector(".center.titleblock a")?;

    let columns: Vec<ElementRef> = document.select(&columns_selector).collect();

    let lookup_start_date =
        |column: &ElementRef| start_date_in(column, &pads_selector, &link_selector);
    let start_date = match columns.get(1).and_then(lookup_start_date) {
        Some(date) => date,
        None => {
            log::warn!("Start date not in the second column, trying the first.");
            columns.first().and_then(lookup_start_date).unwrap_or_else(|| {
                log::warn!("No start date found for show.");
                String::new()
            })
        }
    };

    let run_time = columns
        .get(1)
        .and_then(|column| details_block(column, &pads_selector))
        .and_then(|block| run_time_from_block(&block.inner_html(), line_break))
        .unwrap_or_else(|| {
            log::warn!("Run time not found for show.");
            String::new()
        });

    let synopsis = match document.select(&blurb_selector).next() {
        Some(blurb) => element_text(&blurb),
        None => {
            log::warn!("No synopsis block on the show page.");
            String::new()
        }
    };

    let imdb_url = document
        .select(&imdb_selector)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::to_string);

    Ok(ShowPage {
        start_date,
        run_time,
        synopsis,
        imdb_url,
    })
}

/// The details block is the second `.pads` inside a column.
fn details_block<'a>(column: &ElementRef<'a>, pads: &Selector) -> Option<ElementRef<'a>> {
    column.select(pads).nth(1)
}

fn start_date_in(column: &ElementRef, pads: &Selector, link: &Selector) -> Option<String> {
    details_block(column, pads)?
        .select(link)
        .next()
        .map(|link| element_text(&link))
}

/// The details block is a `<br>` separated list; the fifth line reads
/// `Run time: NN min`.
fn run_time_from_block(block_html: &str, line_break: &Regex) -> Option<String> {
    let line = line_break.split(block_html).nth(4)?;
    let (_, value) = line.split_once(": ")?;
    let fragment = Html::parse_fragment(value);
    let text = fragment.root_element().text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
