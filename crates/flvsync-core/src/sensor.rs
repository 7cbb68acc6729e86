//! Projection of snapshot entries into home-automation sensor states.
//!
//! Each title becomes one sensor whose value is the watch percentage; the
//! rest of the entry rides along as attributes.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::models::{AnimeEntry, Snapshot};

const SENSOR_DOMAIN: &str = "animeflv";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    pub native_value: f64,
    pub attributes: Map<String, Value>,
}

/// Stable sensor id: `animeflv_{profile}_{key}` with the key lowercased and
/// spaces removed.
pub fn unique_id(profile: &str, key: &str) -> String {
    let key = key.to_lowercase().replace(' ', "");
    format!("{SENSOR_DOMAIN}_{profile}_{key}")
}

impl AnimeEntry {
    pub fn sensor_state(&self, profile: &str, key: &str) -> SensorState {
        let attributes = json!({
            "episodesCount": self.episodes_count,
            "lastSeen": self.last_seen_index,
            "inEmission": self.in_emission,
            "nextEpisode": self.next_air_date.map(|d| d.format("%Y-%m-%d").to_string()),
            "today": self.airs_today,
            "nextToWatch": self.next_to_watch_url,
            "description": self.description,
            "cover": self.cover_url,
            "title": self.title,
        });

        SensorState {
            unique_id: unique_id(profile, key),
            name: self.title.clone(),
            native_value: self.progress_percent,
            attributes: match attributes {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

impl Snapshot {
    /// Sensor states for every entry, in listing order.
    pub fn sensor_states(&self) -> Vec<SensorState> {
        self.entries
            .iter()
            .map(|(key, entry)| entry.sensor_state(&self.profile, key))
            .collect()
    }
}
