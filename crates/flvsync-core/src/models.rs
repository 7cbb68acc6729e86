use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use flvsync_api::{DetailPage, ListingItem};

use crate::progress::{self, EpisodeProgress};

/// One title on the user's watching list with its derived progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeEntry {
    pub title: String,
    pub cover_url: String,
    pub detail_url: String,
    pub episodes_count: u32,
    pub last_seen_index: u32,
    pub in_emission: bool,
    pub next_air_date: Option<NaiveDate>,
    pub description: String,
    pub progress_percent: f64,
    pub airs_today: bool,
    pub next_to_watch_url: Option<String>,
}

impl AnimeEntry {
    /// Combine listing and detail data and compute the derived fields.
    ///
    /// `base` is the site root used for the next-episode URL and `today` the
    /// local date the air date is compared against.
    pub fn derive(listed: ListingItem, detail: DetailPage, base: &str, today: NaiveDate) -> Self {
        let watch = EpisodeProgress::new(detail.episodes_count, detail.last_seen_index);
        let next_to_watch_url = watch.next_to_watch_url(base, &listed.detail_url);

        Self {
            title: listed.title,
            cover_url: listed.cover_url,
            detail_url: listed.detail_url,
            episodes_count: detail.episodes_count,
            last_seen_index: detail.last_seen_index,
            in_emission: detail.in_emission,
            next_air_date: detail.next_air_date,
            description: detail.description,
            progress_percent: watch.percent(),
            airs_today: progress::airs_today(detail.next_air_date, today),
            next_to_watch_url,
        }
    }
}

/// Every watched title from one refresh, keyed by slug in listing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub profile: String,
    pub captured_at: DateTime<Utc>,
    pub entries: IndexMap<String, AnimeEntry>,
}

impl Snapshot {
    pub fn new(profile: impl Into<String>, entries: IndexMap<String, AnimeEntry>) -> Self {
        Self {
            profile: profile.into(),
            captured_at: Utc::now(),
            entries,
        }
    }

    pub fn get(&self, key: &str) -> Option<&AnimeEntry> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www3.animeflv.net";

    fn listed(slug: &str) -> ListingItem {
        ListingItem {
            key: slug.to_string(),
            title: slug.to_uppercase(),
            cover_url: format!("{BASE}/uploads/animes/covers/{slug}.jpg"),
            detail_url: format!("{BASE}/anime/{slug}"),
        }
    }

    fn detail(episodes: u32, seen: u32, next: Option<NaiveDate>) -> DetailPage {
        DetailPage {
            episodes_count: episodes,
            last_seen_index: seen,
            in_emission: next.is_some(),
            next_air_date: next,
            description: "Synopsis".into(),
        }
    }

    #[test]
    fn test_derive_airing_today() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        let entry = AnimeEntry::derive(
            listed("sousou-no-frieren"),
            detail(12, 5, Some(today)),
            BASE,
            today,
        );
        assert!(entry.airs_today);
        assert_eq!(entry.progress_percent, 41.67);
        assert_eq!(
            entry.next_to_watch_url.as_deref(),
            Some("https://www3.animeflv.net/ver/sousou-no-frieren-6")
        );
    }

    #[test]
    fn test_derive_finished() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        let entry = AnimeEntry::derive(listed("bleach"), detail(24, 24, None), BASE, today);
        assert_eq!(entry.progress_percent, 100.0);
        assert!(entry.next_to_watch_url.is_none());
        assert!(!entry.airs_today);
    }

    #[test]
    fn test_serialized_field_names() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        let entry = AnimeEntry::derive(listed("bleach"), detail(2, 1, Some(today)), BASE, today);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["episodesCount"], 2);
        assert_eq!(json["lastSeenIndex"], 1);
        assert_eq!(json["nextAirDate"], "2024-05-12");
        assert_eq!(json["progressPercent"], 50.0);
        assert_eq!(json["nextToWatchUrl"], "https://www3.animeflv.net/ver/bleach-2");
    }

    #[test]
    fn test_snapshot_keeps_insertion_order() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        let mut entries = IndexMap::new();
        for slug in ["zetman", "akira", "monster"] {
            entries.insert(
                slug.to_string(),
                AnimeEntry::derive(listed(slug), detail(1, 0, None), BASE, today),
            );
        }
        let snapshot = Snapshot::new("me", entries);
        assert_eq!(
            snapshot.keys().collect::<Vec<_>>(),
            vec!["zetman", "akira", "monster"]
        );
        assert_eq!(snapshot.len(), 3);
    }
}
