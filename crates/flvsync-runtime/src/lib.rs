mod cycle;
mod worker;

#[cfg(test)]
mod testing;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;

use flvsync_api::{Credentials, FlvError};
use flvsync_core::config::AppConfig;
use flvsync_core::Snapshot;

pub use cycle::{CycleSettings, RefreshCycle};
pub use worker::ScraperHandle;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(String),
    #[error("worker error: {0}")]
    Worker(String),
    #[error(transparent)]
    Flv(#[from] FlvError),
}

/// Keeps the latest snapshot and drives refreshes through the scraper
/// worker.
pub struct Runtime {
    scraper: ScraperHandle,
    credentials: Credentials,
    interval: Duration,
    latest: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl Runtime {
    pub fn new(config: &AppConfig) -> Result<Self, RuntimeError> {
        if !config.account.is_complete() {
            return Err(RuntimeError::Config(
                "account.username and account.password must be set".into(),
            ));
        }

        let scraper = ScraperHandle::spawn(CycleSettings::from_config(config))
            .map_err(|e| RuntimeError::Worker(e.to_string()))?;
        let credentials = Credentials::new(&config.account.username, &config.account.password);

        Ok(Self::with_scraper(
            scraper,
            credentials,
            config.refresh.interval(),
        ))
    }

    pub fn with_scraper(scraper: ScraperHandle, credentials: Credentials, interval: Duration) -> Self {
        Self {
            scraper,
            credentials,
            interval,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check the configured credentials; returns the profile slug.
    pub async fn validate(&self) -> Result<String, RuntimeError> {
        Ok(self.scraper.validate(self.credentials.clone()).await?)
    }

    /// Run one cycle and publish its snapshot. A failed cycle leaves the
    /// previous snapshot in place.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, RuntimeError> {
        let snapshot = Arc::new(self.scraper.refresh(self.credentials.clone()).await?);
        *self.latest.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Last successfully published snapshot.
    pub async fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest.read().await.clone()
    }

    /// Refresh immediately and then every `interval` until `shutdown`
    /// resolves, handing each published snapshot to `on_publish`.
    ///
    /// Shutdown is also seen while a refresh is in flight. The worker still
    /// finishes that cycle and signs out, but nothing is published.
    pub async fn run_until<S, P>(&self, shutdown: S, mut on_publish: P)
    where
        S: Future<Output = ()>,
        P: FnMut(&Snapshot),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = self.refresh() => match result {
                    Ok(snapshot) => on_publish(&snapshot),
                    Err(e) => tracing::warn!(error = %e, "Keeping previous snapshot"),
                },
            }
        }

        tracing::info!("Shutdown requested");
    }
}
