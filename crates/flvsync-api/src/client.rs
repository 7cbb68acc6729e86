use url::Url;

use crate::auth::Authenticator;
use crate::error::FlvError;
use crate::scrape::{self, ListingParse};
use crate::session::PageFetcher;
use crate::types::{Credentials, DetailPage};

pub const DEFAULT_HOST: &str = "https://www3.animeflv.net";

/// AnimeFLV site client bound to one session.
///
/// Owns the page fetcher and the sign-in state for the lifetime of a single
/// refresh; a new refresh builds a new client.
pub struct SiteClient<F> {
    fetcher: F,
    host: Url,
    base: String,
    auth: Authenticator,
}

impl<F: PageFetcher> SiteClient<F> {
    pub fn new(fetcher: F, host: &str) -> Result<Self, FlvError> {
        let host =
            Url::parse(host).map_err(|e| FlvError::Api(format!("invalid host {host:?}: {e}")))?;
        let base = host.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            fetcher,
            auth: Authenticator::new(base.clone()),
            host,
            base,
        })
    }

    /// Site root without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub async fn login(&mut self, credentials: &Credentials) -> Result<String, FlvError> {
        self.auth.login(&self.fetcher, credentials).await
    }

    pub async fn logout(&mut self) {
        self.auth.logout(&self.fetcher).await;
    }

    pub fn listing_url(&self, profile: &str) -> String {
        format!("{}/perfil/{profile}/siguiendo?order=updated", self.base)
    }

    /// Fetch and parse the user's "watching" list.
    ///
    /// A non-200 listing page is treated as an empty list, not an error.
    pub async fn fetch_listing(&self, profile: &str) -> Result<ListingParse, FlvError> {
        let url = self.listing_url(profile);
        let page = self.fetcher.get(&url).await?;
        if !page.is_ok() {
            tracing::warn!(
                status = page.status,
                profile,
                "Listing page unavailable, treating as empty"
            );
            return Ok(ListingParse::default());
        }

        let parse = scrape::parse_listing(&page.body, &self.host);
        tracing::debug!(
            items = parse.items.len(),
            malformed = parse.malformed.len(),
            "Listing parsed"
        );
        Ok(parse)
    }

    /// Fetch and parse one title's detail page.
    ///
    /// Non-200 responses and missing script values are errors for this title
    /// only; the caller decides whether that drops the entry.
    pub async fn fetch_detail(&self, detail_url: &str) -> Result<DetailPage, FlvError> {
        let page = self.fetcher.get(detail_url).await?;
        if !page.is_ok() {
            return Err(FlvError::Api(format!(
                "detail page returned HTTP {}",
                page.status
            )));
        }
        Ok(scrape::parse_detail(&page.body)?)
    }
}
