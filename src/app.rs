use std::sync::Arc;

use dhv_core::{AppError, Config};
use dhv_forecast::summary::{column_headers, grid_lines};
use dhv_forecast::{
    AlwaysOnline, ForecastCache, HttpFetcher, JobSpec, NetworkProbe, RefreshOrchestrator,
    RefreshSettings, Scheduler, SqliteStore, TcpProbe,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Name of the recurring refresh job
pub const REFRESH_JOB: &str = "dhv_weather_refresh";
/// Name of the on-demand refresh run at startup
pub const STARTUP_JOB: &str = "dhv_weather_refresh_now";

/// Host process state and lifecycle
pub struct App {
    config: Arc<Config>,
    orchestrator: RefreshOrchestrator,
    scheduler: Scheduler,
    reporter: Option<JoinHandle<()>>,
}

impl App {
    /// Wire up storage, fetcher, orchestrator and scheduler from `config`.
    pub fn new(config: Config) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.config_dir)?;

        let store = Arc::new(SqliteStore::open(config.database_path())?);
        let cache = Arc::new(ForecastCache::open(store)?);
        match cache.current() {
            Some(snapshot) => tracing::info!(
                "Loaded cached forecast with {} regions",
                snapshot.regions().len()
            ),
            None => tracing::info!("No cached forecast yet"),
        }

        let fetcher = Arc::new(HttpFetcher::new()?);
        let orchestrator =
            RefreshOrchestrator::new(fetcher, cache, RefreshSettings::from_config(&config));

        let probe: Arc<dyn NetworkProbe> = if config.refresh.requires_network {
            Arc::new(TcpProbe::for_url(&config.source.url)?)
        } else {
            Arc::new(AlwaysOnline)
        };

        Ok(Self {
            config: Arc::new(config),
            orchestrator,
            scheduler: Scheduler::new(probe),
            reporter: None,
        })
    }

    /// Start the recurring refresh, an immediate refresh and change reporting.
    pub fn start(&mut self) {
        self.reporter = Some(self.spawn_reporter());

        let spec = JobSpec::from_refresh_config(REFRESH_JOB, &self.config.refresh);
        let orchestrator = self.orchestrator.clone();
        let scheduled = self.scheduler.schedule_recurring(spec, move || {
            let orchestrator = orchestrator.clone();
            async move {
                orchestrator.trigger_refresh().await;
            }
        });
        if !scheduled {
            tracing::debug!("Recurring refresh already scheduled");
        }

        let orchestrator = self.orchestrator.clone();
        self.scheduler
            .run_once(STARTUP_JOB, self.config.refresh.requires_network, async move {
                orchestrator.trigger_refresh().await;
            });

        tracing::info!(
            "Refreshing {} every {} minutes",
            self.config.source.url,
            self.config.refresh.interval_minutes
        );
    }

    /// Log a compact view of every new snapshot.
    fn spawn_reporter(&self) -> JoinHandle<()> {
        let mut changes = self.orchestrator.subscribe_changes();
        let orchestrator = self.orchestrator.clone();

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
                let Some(snapshot) = orchestrator.cache().current() else {
                    continue;
                };
                tracing::info!("Forecast: {}", column_headers(&snapshot).join(" | "));
                for line in grid_lines(&snapshot) {
                    tracing::info!("  {}", line);
                }
            }
        })
    }

    /// Stop all jobs
    pub fn shutdown(&mut self) {
        tracing::info!("Shutting down");
        self.scheduler.shutdown();
        if let Some(reporter) = self.reporter.take() {
            reporter.abort();
        }
        let status = self.orchestrator.state();
        if let Some(error) = status.last_error {
            tracing::warn!("Last refresh error: {}", error);
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
