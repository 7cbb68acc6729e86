use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::error::ScrapeError;
use crate::scrape::script;
use crate::types::DetailPage;

/// Sidebar status text shown for titles that are still airing.
pub const IN_EMISSION: &str = "En emision";

static STATUS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("aside.SidebarA .AnmStts span").unwrap());
static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.Description p").unwrap());

/// Parse a title's detail page.
///
/// Fails when the `episodes` or `last_seen` script values are missing or
/// malformed. A missing `anime_info` only means no next air date.
pub fn parse_detail(html: &str) -> Result<DetailPage, ScrapeError> {
    let (status, description) = {
        let doc = Html::parse_document(html);
        let status = first_text(&doc, &STATUS);
        let description = first_text(&doc, &DESCRIPTION).unwrap_or_default();
        (status, description)
    };

    let in_emission = status.as_deref() == Some(IN_EMISSION);
    let episodes_count = script::episodes_count(html)?;
    let last_seen_index = script::last_seen(html)?;

    let next_air_date = if in_emission {
        match script::next_air_date(html) {
            Ok(date) => date,
            Err(e) => {
                tracing::debug!(error = %e, "No air date for title in emission");
                None
            }
        }
    } else {
        None
    };

    Ok(DetailPage {
        episodes_count,
        last_seen_index,
        in_emission,
        next_air_date,
        description,
    })
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
}
