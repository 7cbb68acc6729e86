use tokio::sync::{mpsc, oneshot};

use flvsync_api::{Credentials, FlvError, HttpSession, PageFetcher};
use flvsync_core::Snapshot;

use crate::cycle::{CycleSettings, RefreshCycle};

const THREAD_NAME: &str = "flvsync-scraper";

/// Handle to the scraper thread. Commands run one at a time, each on a
/// fresh session.
#[derive(Clone)]
pub struct ScraperHandle {
    tx: mpsc::UnboundedSender<ScrapeCommand>,
}

enum ScrapeCommand {
    Validate {
        credentials: Credentials,
        reply: oneshot::Sender<Result<String, FlvError>>,
    },
    Refresh {
        credentials: Credentials,
        reply: oneshot::Sender<Result<Snapshot, FlvError>>,
    },
}

impl ScraperHandle {
    /// Start the worker with real HTTP sessions.
    pub fn spawn(settings: CycleSettings) -> Result<Self, FlvError> {
        Self::spawn_with(settings, HttpSession::new)
    }

    /// Start the worker with `new_fetcher` building the session for every
    /// command.
    pub fn spawn_with<F, M>(settings: CycleSettings, new_fetcher: M) -> Result<Self, FlvError>
    where
        F: PageFetcher + 'static,
        M: Fn() -> F + Send + 'static,
    {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FlvError::Api(format!("failed to build scraper runtime: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || worker_loop(rt, settings, new_fetcher, rx))
            .map_err(|e| FlvError::Api(format!("failed to spawn scraper thread: {e}")))?;

        Ok(Self { tx })
    }

    pub async fn validate(&self, credentials: Credentials) -> Result<String, FlvError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(ScrapeCommand::Validate { credentials, reply });
        rx.await.unwrap_or_else(|_| Err(worker_closed()))
    }

    pub async fn refresh(&self, credentials: Credentials) -> Result<Snapshot, FlvError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(ScrapeCommand::Refresh { credentials, reply });
        rx.await.unwrap_or_else(|_| Err(worker_closed()))
    }
}

fn worker_closed() -> FlvError {
    FlvError::Api("scraper worker closed".into())
}

fn worker_loop<F, M>(
    rt: tokio::runtime::Runtime,
    settings: CycleSettings,
    new_fetcher: M,
    mut rx: mpsc::UnboundedReceiver<ScrapeCommand>,
) where
    F: PageFetcher,
    M: Fn() -> F,
{
    tracing::debug!("Scraper worker started");

    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            ScrapeCommand::Validate { credentials, reply } => {
                let result = match RefreshCycle::new(new_fetcher(), credentials, settings.clone()) {
                    Ok(cycle) => rt.block_on(cycle.validate()),
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            ScrapeCommand::Refresh { credentials, reply } => {
                let result = match RefreshCycle::new(new_fetcher(), credentials, settings.clone()) {
                    Ok(cycle) => rt.block_on(cycle.run()),
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
        }
    }

    tracing::debug!("Scraper worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FakeSite, PROFILE};

    fn credentials() -> Credentials {
        Credentials::new("me@example.com", "pw")
    }

    fn handle(site: &FakeSite) -> ScraperHandle {
        let site = site.clone();
        ScraperHandle::spawn_with(CycleSettings::default(), move || site.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_through_worker() {
        let site = FakeSite::with_listing(&[("bleach", "Bleach")]);
        site.detail("bleach", 4, 1, None);

        let snapshot = handle(&site).refresh(credentials()).await.unwrap();
        assert_eq!(snapshot.profile, PROFILE);
        assert_eq!(snapshot.get("bleach").unwrap().progress_percent, 25.0);
        assert_eq!(site.logouts(), 1);
    }

    #[tokio::test]
    async fn test_validate_through_worker() {
        let site = FakeSite::with_listing(&[]);
        let scraper = handle(&site);

        assert_eq!(scraper.validate(credentials()).await.unwrap(), PROFILE);

        site.page(&testing::sign_in_url(), 401, "Unauthorized");
        assert!(scraper
            .validate(credentials())
            .await
            .unwrap_err()
            .is_authentication());
        assert_eq!(site.logouts(), 2);
    }

    #[tokio::test]
    async fn test_commands_run_one_at_a_time() {
        let site = FakeSite::with_listing(&[("bleach", "Bleach")]);
        site.detail("bleach", 4, 1, None);
        let scraper = handle(&site);

        let (a, b) = tokio::join!(
            scraper.refresh(credentials()),
            scraper.refresh(credentials())
        );
        assert!(a.is_ok() && b.is_ok());

        let sign_ins: Vec<usize> = site
            .requests()
            .iter()
            .enumerate()
            .filter(|(_, u)| u.ends_with("/auth/sign_in"))
            .map(|(i, _)| i)
            .collect();
        let sign_outs: Vec<usize> = site
            .requests()
            .iter()
            .enumerate()
            .filter(|(_, u)| u.ends_with("/auth/sign_out"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(sign_ins.len(), 2);
        assert_eq!(sign_outs.len(), 2);
        assert!(sign_outs[0] < sign_ins[1]);
    }

    #[tokio::test]
    async fn test_invalid_host_is_reported_per_command() {
        let site = FakeSite::new();
        let settings = CycleSettings {
            host: "not a url".into(),
            ..CycleSettings::default()
        };
        let fake = site.clone();
        let scraper = ScraperHandle::spawn_with(settings, move || fake.clone()).unwrap();

        assert!(matches!(
            scraper.refresh(credentials()).await,
            Err(FlvError::Api(_))
        ));
        assert!(site.requests().is_empty());
    }
}
