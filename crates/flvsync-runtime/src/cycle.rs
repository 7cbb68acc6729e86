//! One refresh: sign in, read the watching list, fetch every title's detail
//! page, sign out.

use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use flvsync_api::scrape::ListingParse;
use flvsync_api::{Credentials, DetailPage, FlvError, ListingItem, PageFetcher, SiteClient};
use flvsync_core::config::{AppConfig, MalformedItemPolicy};
use flvsync_core::{AnimeEntry, Snapshot};

/// Knobs for a single refresh cycle.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub host: String,
    pub request_timeout: Duration,
    pub max_concurrent_details: usize,
    pub malformed_items: MalformedItemPolicy,
}

impl CycleSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            host: config.site.host.clone(),
            request_timeout: config.refresh.request_timeout(),
            max_concurrent_details: config.refresh.max_concurrent_details.max(1),
            malformed_items: config.refresh.malformed_items,
        }
    }
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// A single login → list → details → logout pass over one session.
///
/// The cycle owns its fetcher; nothing is shared with other cycles. Sign-out
/// runs exactly once whatever happens before it.
pub struct RefreshCycle<F> {
    site: SiteClient<F>,
    credentials: Credentials,
    settings: CycleSettings,
    today: NaiveDate,
}

impl<F: PageFetcher> RefreshCycle<F> {
    pub fn new(
        fetcher: F,
        credentials: Credentials,
        settings: CycleSettings,
    ) -> Result<Self, FlvError> {
        Ok(Self {
            site: SiteClient::new(fetcher, &settings.host)?,
            credentials,
            settings,
            today: Local::now().date_naive(),
        })
    }

    /// Override the date used for the "airs today" flag.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Sign in, sign out, and return the profile slug.
    pub async fn validate(mut self) -> Result<String, FlvError> {
        let result = with_timeout(
            self.settings.request_timeout,
            "sign-in",
            self.site.login(&self.credentials),
        )
        .await;
        self.logout().await;
        result
    }

    /// Run the full cycle and produce a snapshot.
    pub async fn run(mut self) -> Result<Snapshot, FlvError> {
        let result = self.scrape().await;
        self.logout().await;

        match &result {
            Ok(snapshot) => info!(
                profile = %snapshot.profile,
                entries = snapshot.len(),
                "Refresh complete"
            ),
            Err(e) => warn!(error = %e, "Refresh failed"),
        }
        result
    }

    async fn logout(&mut self) {
        if tokio::time::timeout(self.settings.request_timeout, self.site.logout())
            .await
            .is_err()
        {
            warn!("Sign-out timed out");
        }
    }

    async fn scrape(&mut self) -> Result<Snapshot, FlvError> {
        let limit = self.settings.request_timeout;

        let profile = with_timeout(limit, "sign-in", self.site.login(&self.credentials)).await?;
        if profile.is_empty() {
            return Err(FlvError::Authentication("empty profile identifier".into()));
        }

        let listing = with_timeout(limit, "listing page", self.site.fetch_listing(&profile)).await?;
        let items = self.apply_item_policy(listing)?;
        debug!(titles = items.len(), "Fetching detail pages");

        let entries = self.fetch_details(items).await;
        Ok(Snapshot::new(profile, entries))
    }

    fn apply_item_policy(&self, listing: ListingParse) -> Result<Vec<ListingItem>, FlvError> {
        if let Some(first) = listing.malformed.first() {
            match self.settings.malformed_items {
                MalformedItemPolicy::Skip => {
                    for e in &listing.malformed {
                        warn!(error = %e, "Skipping malformed listing item");
                    }
                }
                MalformedItemPolicy::Abort => {
                    return Err(FlvError::Api(format!(
                        "listing has {} malformed item(s), first: {first}",
                        listing.malformed.len()
                    )));
                }
            }
        }
        Ok(listing.items)
    }

    /// Fetch detail pages with bounded concurrency. Results keep listing
    /// order; a title whose page fails or times out is left out.
    async fn fetch_details(&self, items: Vec<ListingItem>) -> IndexMap<String, AnimeEntry> {
        let site = &self.site;
        let limit = self.settings.request_timeout;

        let results: Vec<(ListingItem, Result<DetailPage, FlvError>)> = stream::iter(items)
            .map(|item| async move {
                let detail = with_timeout(limit, "detail page", site.fetch_detail(&item.detail_url))
                    .await;
                (item, detail)
            })
            .buffered(self.settings.max_concurrent_details.max(1))
            .collect()
            .await;

        let mut entries = IndexMap::with_capacity(results.len());
        for (item, detail) in results {
            match detail {
                Ok(detail) => {
                    let key = item.key.clone();
                    entries.insert(key, AnimeEntry::derive(item, detail, site.base(), self.today));
                }
                Err(e) => warn!(key = %item.key, error = %e, "Skipping title"),
            }
        }
        entries
    }
}

async fn with_timeout<T>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = Result<T, FlvError>>,
) -> Result<T, FlvError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| FlvError::Communication(format!("{what} timed out after {limit:?}")))?
}
