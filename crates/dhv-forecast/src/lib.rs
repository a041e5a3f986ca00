//! DHV paragliding forecast: page parsing, refresh orchestration and caching.
//!
//! The pieces compose as:
//! fetch ([`Fetcher`]) → parse ([`parse_forecast`]) → store ([`ForecastCache`]),
//! driven by a [`RefreshOrchestrator`] and scheduled by a [`Scheduler`].

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod notify;
pub mod orchestrator;
pub mod parser;
pub mod refresh;
pub mod retry;
pub mod scheduler;
pub mod store;
pub mod summary;
pub mod types;

pub use cache::ForecastCache;
pub use error::RefreshError;
pub use fetcher::{Fetcher, HttpFetcher};
pub use notify::{DataChanged, Notifier};
pub use orchestrator::{RefreshOrchestrator, RefreshOutcome, RefreshSettings};
pub use parser::{parse_forecast, RegionTable};
pub use refresh::{RefreshMachine, RefreshState, RefreshStatus};
pub use retry::RetryConfig;
pub use scheduler::{AlwaysOnline, JobSpec, NetworkProbe, Scheduler, TcpProbe};
pub use store::{MemoryStore, SnapshotStore, SqliteStore, SNAPSHOT_KEY};
pub use types::{DayForecast, DayToken, ForecastSnapshot, InvalidForecast, RegionForecast, Status};
