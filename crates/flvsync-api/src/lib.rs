//! AnimeFLV client: browser-like session, sign-in, and scrapers for the
//! watching list and title detail pages.

pub mod auth;
pub mod client;
pub mod error;
pub mod scrape;
pub mod session;
pub mod types;

pub use auth::{AuthState, Authenticator};
pub use client::{SiteClient, DEFAULT_HOST};
pub use error::{FlvError, ScrapeError};
pub use session::{HttpSession, Page, PageFetcher};
pub use types::{Credentials, DetailPage, ListingItem};
