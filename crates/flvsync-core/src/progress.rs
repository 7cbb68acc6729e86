//! Watch-progress derivation for one title.

use chrono::NaiveDate;

/// Episode position of the user within one title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeProgress {
    pub episodes_count: u32,
    pub last_seen_index: u32,
}

impl EpisodeProgress {
    pub fn new(episodes_count: u32, last_seen_index: u32) -> Self {
        Self {
            episodes_count,
            last_seen_index,
        }
    }

    /// Percentage watched, rounded to two decimals and kept within 0..=100.
    /// A title with no known episodes is at 0%.
    pub fn percent(&self) -> f64 {
        if self.episodes_count == 0 {
            return 0.0;
        }
        let raw = f64::from(self.last_seen_index) / f64::from(self.episodes_count) * 100.0;
        round2(raw).clamp(0.0, 100.0)
    }

    /// Number of the next episode to watch, if any are left.
    pub fn next_episode(&self) -> Option<u32> {
        (self.last_seen_index < self.episodes_count).then(|| self.last_seen_index + 1)
    }

    /// Player URL of the next unseen episode: `{base}/ver/{slug}-{n}`, where
    /// `slug` is the last path segment of the detail URL.
    pub fn next_to_watch_url(&self, base: &str, detail_url: &str) -> Option<String> {
        let next = self.next_episode()?;
        let slug = last_path_segment(detail_url);
        Some(format!("{}/ver/{slug}-{next}", base.trim_end_matches('/')))
    }
}

/// Whether a title's next episode airs on `today`.
pub fn airs_today(next_air_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    next_air_date == Some(today)
}

/// Round to two decimals, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn last_path_segment(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}
