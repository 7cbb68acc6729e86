use chrono::NaiveDate;

/// Account credentials used to sign in to AnimeFLV.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ── Listing page ────────────────────────────────────────────────

/// One title from the "siguiendo" (watching) listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    /// Detail path with the `/anime/` prefix removed.
    pub key: String,
    pub title: String,
    pub cover_url: String,
    pub detail_url: String,
}

// ── Detail page ─────────────────────────────────────────────────

/// Values scraped from a title's detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPage {
    pub episodes_count: u32,
    pub last_seen_index: u32,
    pub in_emission: bool,
    pub next_air_date: Option<NaiveDate>,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("frieren@example.com", "hunter2");
        let shown = format!("{creds:?}");
        assert!(shown.contains("frieren@example.com"));
        assert!(!shown.contains("hunter2"));
    }
}
