//! Browser-like HTTP session.
//!
//! AnimeFLV sits behind an anti-bot layer that rejects obvious library
//! clients, so every request goes through a single cookie-carrying client
//! that presents itself as Firefox on Android.

use std::future::Future;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use tokio::sync::OnceCell;

use crate::error::FlvError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Android 14; Mobile; rv:128.0) Gecko/128.0 Firefox/128.0";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "es-ES,es;q=0.8,en-US;q=0.5,en;q=0.3";

/// A fetched page: status, headers and the decoded body text.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl Page {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// The site only counts a plain `200` as a usable page.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues page requests on behalf of one refresh cycle.
///
/// Implementations never retry. Transport failures come back as
/// [`FlvError::Communication`]; non-200 statuses are returned as pages and
/// left for the caller to judge.
pub trait PageFetcher: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<Page, FlvError>> + Send;

    fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> impl Future<Output = Result<Page, FlvError>> + Send;
}

/// Lazily-built browser-fingerprinted session with its own cookie jar.
#[derive(Debug, Default)]
pub struct HttpSession {
    client: OnceCell<Client>,
}

impl HttpSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the underlying client, building it on first use.
    pub async fn get_session(&self) -> Result<&Client, FlvError> {
        self.client
            .get_or_try_init(|| async {
                tracing::debug!("Building browser session");
                build_client()
            })
            .await
    }
}

fn build_client() -> Result<Client, FlvError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE),
    );

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .cookie_store(true)
        .gzip(true)
        .build()
        .map_err(|e| FlvError::Api(format!("failed to build HTTP session: {e}")))
}

async fn into_page(resp: reqwest::Response) -> Result<Page, FlvError> {
    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let body = resp.text().await?;
    Ok(Page {
        status,
        headers,
        body,
    })
}

impl PageFetcher for HttpSession {
    async fn get(&self, url: &str) -> Result<Page, FlvError> {
        let client = self.get_session().await?;
        tracing::debug!(url, "GET");
        let resp = client.get(url).send().await?;
        let page = into_page(resp).await?;
        tracing::debug!(url, status = page.status, "GET response received");
        Ok(page)
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Page, FlvError> {
        let client = self.get_session().await?;
        tracing::debug!(url, "POST");
        let resp = client.post(url).form(form).send().await?;
        let page = into_page(resp).await?;
        tracing::debug!(url, status = page.status, "POST response received");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_is_ok_only_for_200() {
        assert!(Page::new(200, "").is_ok());
        assert!(!Page::new(204, "").is_ok());
        assert!(!Page::new(302, "").is_ok());
        assert!(!Page::new(500, "").is_ok());
    }

    #[tokio::test]
    async fn test_session_is_built_once() {
        let session = HttpSession::new();
        let first = session.get_session().await.unwrap() as *const Client;
        let second = session.get_session().await.unwrap() as *const Client;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_communication_error() {
        let session = HttpSession::new();
        let err = session.get("http://127.0.0.1:9/").await.unwrap_err();
        assert!(err.is_communication(), "got {err:?}");
    }
}
