//! Named background jobs: recurring refreshes and one-shot runs.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dhv_core::{ConflictPolicy, NetworkError, RefreshConfig};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Precondition checked before a job that requires the network runs.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn is_available(&self) -> bool;
}

/// Reports the network as available if a TCP connection to the source host succeeds.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Probe the host and port the given URL points at.
    pub fn for_url(url: &str) -> Result<Self, NetworkError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| NetworkError::InvalidUrl(format!("{url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| NetworkError::InvalidUrl(format!("no host in {url}")))?;
        let port = parsed.port_or_known_default().unwrap_or(443);
        Ok(Self::new(host, port, Duration::from_secs(3)))
    }
}

#[async_trait]
impl NetworkProbe for TcpProbe {
    async fn is_available(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        matches!(tokio::time::timeout(self.timeout, connect).await, Ok(Ok(_)))
    }
}

/// Probe that never blocks a run
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

#[async_trait]
impl NetworkProbe for AlwaysOnline {
    async fn is_available(&self) -> bool {
        true
    }
}

/// How a recurring job is registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub interval: Duration,
    pub conflict: ConflictPolicy,
    pub requires_network: bool,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            conflict: ConflictPolicy::Keep,
            requires_network: false,
        }
    }

    /// Interval, conflict policy and network requirement from the refresh settings
    pub fn from_refresh_config(name: impl Into<String>, config: &RefreshConfig) -> Self {
        Self {
            name: name.into(),
            interval: Duration::from_secs(u64::from(config.interval_minutes) * 60),
            conflict: config.conflict_policy,
            requires_network: config.requires_network,
        }
    }

    pub fn with_conflict(mut self, conflict: ConflictPolicy) -> Self {
        self.conflict = conflict;
        self
    }

    pub fn with_network_requirement(mut self, requires_network: bool) -> Self {
        self.requires_network = requires_network;
        self
    }
}

struct ScheduledJob {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScheduledJob {
    fn is_live(&self) -> bool {
        !self.handle.is_finished()
    }

    fn stop(&self) {
        self.token.cancel();
        self.handle.abort();
    }
}

/// Runs named jobs on tokio tasks until cancelled or shut down.
pub struct Scheduler {
    probe: Arc<dyn NetworkProbe>,
    shutdown: CancellationToken,
    jobs: Mutex<HashMap<String, ScheduledJob>>,
}

impl Scheduler {
    pub fn new(probe: Arc<dyn NetworkProbe>) -> Self {
        Self {
            probe,
            shutdown: CancellationToken::new(),
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Run `job` every `spec.interval`, first after one interval has passed.
    ///
    /// Returns false if a live job with the same name was kept.
    pub fn schedule_recurring<F, Fut>(&self, spec: JobSpec, job: F) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut jobs = self.jobs.lock();
        if let Some(existing) = jobs.get(&spec.name).filter(|j| j.is_live()) {
            match spec.conflict {
                ConflictPolicy::Keep => {
                    debug!(job = %spec.name, "Keeping existing schedule");
                    return false;
                }
                ConflictPolicy::Replace => {
                    debug!(job = %spec.name, "Replacing existing schedule");
                    existing.stop();
                }
            }
        }

        let token = self.shutdown.child_token();
        let probe = Arc::clone(&self.probe);
        let period = spec.interval.max(Duration::from_millis(1));
        let name = spec.name.clone();
        let requires_network = spec.requires_network;
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                if requires_network && !probe.is_available().await {
                    info!(job = %name, "Network unavailable, skipping run");
                    continue;
                }
                debug!(job = %name, "Running scheduled job");
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = job() => {}
                }
            }
            debug!(job = %name, "Scheduled job stopped");
        });

        info!(job = %spec.name, interval = ?spec.interval, "Scheduled recurring job");
        jobs.insert(spec.name, ScheduledJob { token, handle });
        true
    }

    /// Run `job` once, right away. A live job with the same name is replaced.
    pub fn run_once<Fut>(&self, name: impl Into<String>, requires_network: bool, job: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let mut jobs = self.jobs.lock();
        if let Some(existing) = jobs.remove(&name).filter(|j| j.is_live()) {
            debug!(job = %name, "Replacing pending one-shot job");
            existing.stop();
        }

        let token = self.shutdown.child_token();
        let cancelled = token.clone();
        let probe = Arc::clone(&self.probe);
        let job_name = name.clone();

        let handle = tokio::spawn(async move {
            if requires_network && !probe.is_available().await {
                info!(job = %job_name, "Network unavailable, skipping one-shot run");
                return;
            }
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = job => {}
            }
        });
        jobs.insert(name, ScheduledJob { token, handle });
    }

    /// Stop the named job. Returns false if nothing was registered under `name`.
    pub fn cancel(&self, name: &str) -> bool {
        match self.jobs.lock().remove(name) {
            Some(job) => {
                job.stop();
                debug!(job = %name, "Cancelled job");
                true
            }
            None => false,
        }
    }

    /// True while a job with this name is registered and has not finished.
    pub fn is_scheduled(&self, name: &str) -> bool {
        self.jobs.lock().get(name).is_some_and(ScheduledJob::is_live)
    }

    /// Stop every job.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        for (_, job) in self.jobs.lock().drain() {
            job.handle.abort();
        }
        info!("Scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
