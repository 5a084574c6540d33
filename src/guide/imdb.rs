//! Lookups on IMDb title pages, used when epguides.com has no synopsis or
//! poster for a show.

use anyhow::Result;
use scraper::Html;

use super::pages::{element_text, selector};

/// Plot summary of a title page, if present and non-empty.
pub fn parse_plot(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let plot_selector = selector(r#"span[data-testid="plot-xl"]"#)?;

    Ok(document
        .select(&plot_selector)
        .next()
        .map(|plot| element_text(&plot))
        .filter(|plot| !plot.is_empty()))
}

/// The poster overlay on a title page links to the media viewer.
pub fn parse_media_viewer_link(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let overlay_selector = selector(".ipc-lockup-overlay.ipc-focusable")?;

    Ok(document
        .select(&overlay_selector)
        .next()
        .and_then(|link| link.value().attr("href"))
        .map(str::to_string))
}

/// The media viewer shows the full-size poster as its second image.
pub fn parse_poster_image(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let image_selector = selector("img")?;

    Ok(document
        .select(&image_selector)
        .nth(1)
        .and_then(|image| image.value().attr("src"))
        .map(str::to_string))
}
