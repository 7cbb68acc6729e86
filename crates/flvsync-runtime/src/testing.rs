//! In-memory AnimeFLV stand-in for cycle and runtime tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flvsync_api::{FlvError, Page, PageFetcher};

pub const BASE: &str = "https://www3.animeflv.net";
pub const PROFILE: &str = "frieren_fan";

pub fn sign_in_url() -> String {
    format!("{BASE}/auth/sign_in")
}

pub fn listing_url() -> String {
    format!("{BASE}/perfil/{PROFILE}/siguiendo?order=updated")
}

pub fn detail_url(slug: &str) -> String {
    format!("{BASE}/anime/{slug}")
}

pub fn home_page() -> String {
    format!(r#"<nav><a class="Login" href="/perfil/{PROFILE}"><span>Mi Perfil</span></a></nav>"#)
}

pub fn listing_page(titles: &[(&str, &str)]) -> String {
    let items: String = titles
        .iter()
        .map(|(slug, title)| {
            format!(
                r#"<li><article class="Anime alt B"><a href="/anime/{slug}">
                    <div class="Image"><figure><img src="/uploads/animes/covers/{slug}.jpg" alt="{title}"></figure></div>
                    <h3 class="Title">{title}</h3></a></article></li>"#
            )
        })
        .collect();
    format!(r#"<html><body><ul class="ListAnimes AX Rows A03 C02 D02">{items}</ul></body></html>"#)
}

pub fn detail_page(episodes: u32, last_seen: u32, next_air_date: Option<&str>) -> String {
    let pairs: Vec<String> = (1..=episodes)
        .rev()
        .map(|n| format!("[{n},{}]", 50_000 + n))
        .collect();
    let status = if next_air_date.is_some() {
        "En emision"
    } else {
        "Finalizado"
    };
    let info = match next_air_date {
        Some(date) => format!(r#"var anime_info = ["4100","Title","slug","{date}"];"#),
        None => r#"var anime_info = ["4100","Title","slug"];"#.to_string(),
    };
    format!(
        r#"<html><body>
        <aside class="SidebarA BFixed"><p class="AnmStts"><span class="fa-tv">{status}</span></p></aside>
        <div class="Description"><p>Synopsis for the title.</p></div>
        <script>
            {info}
            var episodes = [{}];
            var last_seen = {last_seen};
        </script>
        </body></html>"#,
        pairs.join(",")
    )
}

#[derive(Default)]
struct Inner {
    pages: Mutex<HashMap<String, Page>>,
    delays: Mutex<HashMap<String, Duration>>,
    broken: Mutex<Vec<String>>,
    requests: Mutex<Vec<String>>,
    logouts: AtomicUsize,
}

/// Serves canned pages by URL and counts sign-outs. Clones share state.
#[derive(Clone, Default)]
pub struct FakeSite {
    inner: Arc<Inner>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// A site where sign-in succeeds and the listing shows `titles`.
    pub fn with_listing(titles: &[(&str, &str)]) -> Self {
        let site = Self::new();
        site.page(&sign_in_url(), 200, home_page());
        site.page(&listing_url(), 200, listing_page(titles));
        site
    }

    pub fn page(&self, url: &str, status: u16, body: impl Into<String>) {
        self.inner
            .pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Page::new(status, body));
    }

    pub fn detail(&self, slug: &str, episodes: u32, last_seen: u32, next_air_date: Option<&str>) {
        self.page(
            &detail_url(slug),
            200,
            detail_page(episodes, last_seen, next_air_date),
        );
    }

    /// Delay every response for `url`.
    pub fn slow(&self, url: &str, delay: Duration) {
        self.inner
            .delays
            .lock()
            .unwrap()
            .insert(url.to_string(), delay);
    }

    /// Fail every request for `url` with a transport error.
    pub fn break_url(&self, url: &str) {
        self.inner.broken.lock().unwrap().push(url.to_string());
    }

    pub fn logouts(&self) -> usize {
        self.inner.logouts.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.inner.requests.lock().unwrap().clone()
    }

    async fn respond(&self, url: &str) -> Result<Page, FlvError> {
        self.inner.requests.lock().unwrap().push(url.to_string());

        let delay = self.inner.delays.lock().unwrap().get(url).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if url.ends_with("/auth/sign_out") {
            self.inner.logouts.fetch_add(1, Ordering::SeqCst);
            return Ok(Page::new(302, ""));
        }
        if self.inner.broken.lock().unwrap().iter().any(|u| u == url) {
            return Err(FlvError::Communication(format!("connection reset: {url}")));
        }

        Ok(self
            .inner
            .pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Page::new(404, "Not Found")))
    }
}

impl PageFetcher for FakeSite {
    async fn get(&self, url: &str) -> Result<Page, FlvError> {
        self.respond(url).await
    }

    async fn post_form(&self, url: &str, _form: &[(&str, &str)]) -> Result<Page, FlvError> {
        self.respond(url).await
    }
}
