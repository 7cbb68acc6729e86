use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ScrapeError;
use crate::types::ListingItem;

/// Path prefix shared by every detail page.
pub const ANIME_PATH_PREFIX: &str = "/anime/";

static ITEMS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul.ListAnimes > li").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static IMAGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3.Title").unwrap());

/// Result of parsing a listing page: the usable items in page order plus
/// one error per item that could not be read.
#[derive(Debug, Default)]
pub struct ListingParse {
    pub items: Vec<ListingItem>,
    pub malformed: Vec<ScrapeError>,
}

/// Derive the entry key from a detail path: `/anime/one-piece` → `one-piece`.
pub fn entry_key(detail_path: &str) -> String {
    detail_path
        .strip_prefix(ANIME_PATH_PREFIX)
        .unwrap_or(detail_path)
        .trim_matches('/')
        .to_string()
}

/// Parse the "siguiendo" listing. A page without the list container yields
/// no items. Later items whose key repeats an earlier one are dropped.
pub fn parse_listing(html: &str, host: &Url) -> ListingParse {
    let doc = Html::parse_document(html);
    let mut parse = ListingParse::default();
    let mut seen = HashSet::new();

    for (index, li) in doc.select(&ITEMS).enumerate() {
        match parse_item(li, host) {
            Ok(item) => {
                if seen.insert(item.key.clone()) {
                    parse.items.push(item);
                } else {
                    tracing::warn!(key = %item.key, "Duplicate listing entry dropped");
                }
            }
            Err(reason) => parse.malformed.push(ScrapeError::MalformedItem { index, reason }),
        }
    }

    parse
}

fn parse_item(li: ElementRef<'_>, host: &Url) -> Result<ListingItem, String> {
    let detail = li
        .select(&LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| host.join(href).ok())
        .find(|url| url.path().starts_with(ANIME_PATH_PREFIX))
        .ok_or("no detail link")?;

    let img = li.select(&IMAGE).next().ok_or("no cover image")?;
    let src = img
        .value()
        .attr("src")
        .or_else(|| img.value().attr("data-src"))
        .filter(|s| !s.trim().is_empty())
        .ok_or("cover image has no source")?;
    let cover = host
        .join(src.trim())
        .map_err(|e| format!("bad cover URL {src:?}: {e}"))?;

    let title = li
        .select(&TITLE)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            img.value()
                .attr("alt")
                .map(|alt| alt.trim().to_string())
                .filter(|t| !t.is_empty())
        })
        .ok_or("no title")?;

    let key = entry_key(detail.path());
    if key.is_empty() {
        return Err("detail link has an empty slug".into());
    }

    Ok(ListingItem {
        key,
        title,
        cover_url: cover.to_string(),
        detail_url: detail.to_string(),
    })
}
