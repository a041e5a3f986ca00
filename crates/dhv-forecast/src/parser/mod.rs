//! Forecast page parsing.
//!
//! Pipeline: markup → [`blocks::flatten`] → [`regions::segment_regions`] →
//! [`days::segment_days`] per region → [`snapshot::build_snapshot`].
//! Every stage is pure; unparsable pieces disappear instead of failing the run.

pub mod blocks;
pub mod compose;
pub mod date;
pub mod days;
pub mod regions;
pub mod snapshot;
pub mod status;

pub use blocks::{flatten, Block, BlockKind};
pub use compose::compose;
pub use date::{extract_day, header_day, DayMatch, HEADER_WINDOW};
pub use days::segment_days;
pub use regions::{normalize_region_name, segment_regions, RegionAnchor, RegionBlock, RegionTable};
pub use snapshot::build_snapshot;
pub use status::classify;

use crate::types::ForecastSnapshot;

/// Parse a fetched document into a snapshot.
pub fn parse_forecast(document: &str, table: &RegionTable) -> ForecastSnapshot {
    let blocks = flatten(document);
    build_snapshot(&blocks, table)
}
