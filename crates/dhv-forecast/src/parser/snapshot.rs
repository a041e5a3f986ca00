use tracing::debug;

use super::blocks::Block;
use super::days::segment_days;
use super::regions::{segment_regions, RegionTable};
use crate::types::{ForecastSnapshot, RegionForecast};

/// Assemble a snapshot from flattened blocks.
///
/// Never fails: regions without a single parsable day are dropped, and a
/// document with no usable region yields an empty snapshot.
pub fn build_snapshot(blocks: &[Block], table: &RegionTable) -> ForecastSnapshot {
    let regions = segment_regions(blocks, table)
        .into_iter()
        .filter_map(|region| {
            let days = segment_days(region.blocks);
            let day_count = days.len();
            let forecast = RegionForecast::new(region.name.clone(), days);
            match &forecast {
                Some(_) => debug!(region = %region.name, days = day_count, "Parsed region"),
                None => debug!(region = %region.raw_name, "Dropping region without days"),
            }
            forecast
        })
        .collect();

    ForecastSnapshot::new(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;

    #[test]
    fn test_drops_regions_without_days() {
        let blocks = vec![
            Block::heading("Deutschland"),
            Block::text("Keine Vorhersage verfügbar"),
            Block::heading("Nordalpen"),
            Block::heading("Mo 08.12.: Sonnig").with_markers(["good"]),
        ];
        let snapshot = build_snapshot(&blocks, &RegionTable::dhv_default());

        assert_eq!(snapshot.regions().len(), 1);
        assert_eq!(snapshot.regions()[0].region_name(), "NA");
        assert_eq!(snapshot.regions()[0].days()[0].status, Status::Good);
    }

    #[test]
    fn test_no_regions_yields_empty_snapshot() {
        let blocks = vec![Block::heading("Wartungsarbeiten"), Block::text("Bitte später")];
        let snapshot = build_snapshot(&blocks, &RegionTable::dhv_default());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_round_trip_of_built_snapshot() {
        let blocks = vec![
            Block::heading("Südalpen"),
            Block::heading("Mo 08.12.: Nordföhn"),
            Block::text("Nicht fliegbar. Wind: Nord 50km/h").with_markers(["bad"]),
            Block::heading("Di 09.12.: Besser"),
        ];
        let snapshot = build_snapshot(&blocks, &RegionTable::dhv_default());
        assert_eq!(snapshot.day_count(), 2);
        assert_eq!(snapshot.regions()[0].days()[1].wind_text, "");

        let json = snapshot.to_json().unwrap();
        assert_eq!(ForecastSnapshot::from_json(&json).unwrap(), snapshot);
    }
}
