//! Drives refresh runs: fetch, parse, store, retry, notify.
//!
//! At most one run is in flight. Triggers that arrive while a run is going
//! attach to it and receive its outcome instead of starting another.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dhv_core::{Config, EmptySnapshotPolicy, SourceConfig, StorageError};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::cache::ForecastCache;
use crate::error::RefreshError;
use crate::fetcher::Fetcher;
use crate::notify::{DataChanged, Notifier};
use crate::parser::{parse_forecast, RegionTable};
use crate::refresh::{RefreshMachine, RefreshState, RefreshStatus};
use crate::retry::RetryConfig;
use crate::types::ForecastSnapshot;

/// Everything a run needs besides its collaborators
#[derive(Debug, Clone)]
pub struct RefreshSettings {
    pub source: SourceConfig,
    pub retry: RetryConfig,
    pub empty_snapshot: EmptySnapshotPolicy,
    pub regions: RegionTable,
}

impl RefreshSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source: config.source.clone(),
            retry: RetryConfig::from(&config.refresh),
            empty_snapshot: config.refresh.empty_snapshot,
            regions: RegionTable::new(&config.regions),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_secs)
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Result of one refresh run, shared by every trigger that joined it
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Updated(Arc<ForecastSnapshot>),
    Failed { attempts: u32, error: String },
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated(_))
    }
}

type InFlight = watch::Receiver<Option<RefreshOutcome>>;

struct Inner {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<ForecastCache>,
    settings: RefreshSettings,
    notifier: Notifier,
    status_tx: watch::Sender<RefreshStatus>,
    in_flight: Mutex<Option<InFlight>>,
}

/// Cheap to clone; clones share the same run and state.
#[derive(Clone)]
pub struct RefreshOrchestrator {
    inner: Arc<Inner>,
}

impl RefreshOrchestrator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<ForecastCache>,
        settings: RefreshSettings,
    ) -> Self {
        let (status_tx, _) = watch::channel(RefreshStatus::default());
        Self {
            inner: Arc::new(Inner {
                fetcher,
                cache,
                settings,
                notifier: Notifier::default(),
                status_tx,
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Start a refresh, or join the one already running, and wait for its outcome.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn trigger_refresh(&self) -> RefreshOutcome {
        let mut rx = self.join_or_spawn();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(lost_run_outcome)
    }

    fn join_or_spawn(&self) -> InFlight {
        let mut in_flight = self.inner.in_flight.lock();
        if let Some(rx) = in_flight.as_ref() {
            // A closed channel means the run task died without reporting
            if rx.has_changed().is_ok() {
                debug!("Refresh already running, joining it");
                return rx.clone();
            }
        }

        let (tx, rx) = watch::channel(None);
        *in_flight = Some(rx.clone());

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = inner.run().await;
            *inner.in_flight.lock() = None;
            let _ = tx.send(Some(outcome));
        });
        rx
    }

    /// Current state, readable from any context
    pub fn state(&self) -> RefreshStatus {
        self.inner.status_tx.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<RefreshStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<DataChanged> {
        self.inner.notifier.subscribe()
    }

    pub fn cache(&self) -> &Arc<ForecastCache> {
        &self.inner.cache
    }
}

fn lost_run_outcome() -> RefreshOutcome {
    RefreshOutcome::Failed {
        attempts: 0,
        error: "refresh task ended without a result".to_string(),
    }
}

impl Inner {
    async fn run(&self) -> RefreshOutcome {
        let mut machine = RefreshMachine::new(self.settings.retry.max_attempts);
        machine.start();
        self.publish(&machine, |status| {
            status.terminal_failure = false;
            status.last_error = None;
        });

        loop {
            match self.attempt().await {
                Ok(snapshot) => {
                    machine.on_success();
                    let now = Utc::now();
                    self.publish(&machine, |status| {
                        status.last_error = None;
                        status.last_success = Some(now);
                    });
                    info!(
                        regions = snapshot.regions().len(),
                        days = snapshot.day_count(),
                        "Forecast refreshed"
                    );
                    machine.finish();
                    self.publish(&machine, |_| {});
                    self.notifier.notify();
                    return RefreshOutcome::Updated(snapshot);
                }
                Err(e) => {
                    let message = e.to_string();
                    let next = if e.is_retryable() {
                        machine.on_failure()
                    } else {
                        machine.on_fatal()
                    };

                    match next {
                        RefreshState::Retrying(failures) => {
                            let delay = self.settings.retry.delay_after(failures);
                            warn!(
                                attempt = failures,
                                max_attempts = self.settings.retry.max_attempts,
                                ?delay,
                                error = %e,
                                "Refresh attempt failed, retrying"
                            );
                            self.publish(&machine, |status| status.last_error = Some(message));
                            tokio::time::sleep(delay).await;
                            machine.on_retry();
                            self.publish(&machine, |_| {});
                        }
                        _ => {
                            let attempts = machine.attempt();
                            error!(attempts, error = %e, "Refresh failed, keeping previous forecast");
                            self.publish(&machine, |status| {
                                status.terminal_failure = true;
                                status.last_error = Some(message.clone());
                            });
                            machine.finish();
                            self.publish(&machine, |_| {});
                            return RefreshOutcome::Failed {
                                attempts,
                                error: message,
                            };
                        }
                    }
                }
            }
        }
    }

    async fn attempt(&self) -> Result<Arc<ForecastSnapshot>, RefreshError> {
        let source = &self.settings.source;
        let document = self
            .fetcher
            .fetch(&source.url, &source.user_agent, self.settings.timeout())
            .await?;

        let snapshot = parse_forecast(&document, &self.settings.regions);
        if snapshot.is_empty() {
            match self.settings.empty_snapshot {
                EmptySnapshotPolicy::Reject => return Err(RefreshError::EmptySnapshot),
                EmptySnapshotPolicy::Accept => warn!("Storing empty forecast snapshot"),
            }
        }

        let cache = Arc::clone(&self.cache);
        let stored = tokio::task::spawn_blocking(move || cache.replace(snapshot))
            .await
            .map_err(|e| StorageError::QueryFailed(format!("store task failed: {e}")))??;
        Ok(stored)
    }

    fn publish(&self, machine: &RefreshMachine, update: impl FnOnce(&mut RefreshStatus)) {
        self.status_tx.send_modify(|status| {
            status.state = machine.state();
            status.attempt = machine.attempt();
            update(status);
        });
    }
}

impl std::fmt::Debug for RefreshOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshOrchestrator")
            .field("settings", &self.inner.settings)
            .field("status", &*self.inner.status_tx.borrow())
            .finish()
    }
}
