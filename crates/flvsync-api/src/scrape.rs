//! Page scrapers for the AnimeFLV site.
//!
//! Structured markup is read through CSS selectors; values the site only
//! exposes inside inline `<script>` blocks go through [`script`].

pub mod detail;
pub mod listing;
pub mod script;

pub use detail::parse_detail;
pub use listing::{entry_key, parse_listing, ListingParse};
