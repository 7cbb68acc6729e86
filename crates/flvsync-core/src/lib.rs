pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod sensor;

pub use models::{AnimeEntry, Snapshot};
