//! Compact text renderings of a snapshot for logs and small displays.

use crate::types::{DayToken, ForecastSnapshot};

/// Regions and days shown in a compact grid
pub const GRID_REGIONS: usize = 3;
pub const GRID_DAYS: usize = 3;

/// English weekday for a German day token (`Mo`, `Di.`, ...); unknown abbreviations pass through.
pub fn weekday_name(token: &DayToken) -> &str {
    match token.weekday() {
        "Mo" => "Monday",
        "Di" => "Tuesday",
        "Mi" => "Wednesday",
        "Do" => "Thursday",
        "Fr" => "Friday",
        "Sa" => "Saturday",
        "So" => "Sunday",
        other => other,
    }
}

/// Column titles for the grid, based on the first region.
///
/// Empty when there is nothing to show. The third column carries the weekday
/// of the third day and is left out when that day is missing.
pub fn column_headers(snapshot: &ForecastSnapshot) -> Vec<String> {
    let Some(first) = snapshot.regions().first() else {
        return Vec::new();
    };

    let mut headers = vec!["Today".to_string(), "Tomorrow".to_string()];
    if let Some(third) = first.days().get(2) {
        headers.push(weekday_name(&third.date).to_string());
    }
    headers
}

/// One line per region: name followed by the status of its first days.
pub fn grid_lines(snapshot: &ForecastSnapshot) -> Vec<String> {
    snapshot
        .regions()
        .iter()
        .take(GRID_REGIONS)
        .map(|region| {
            let cells: Vec<String> = region
                .days()
                .iter()
                .take(GRID_DAYS)
                .map(|day| format!("{} {}", day.date.weekday(), day.status.label()))
                .collect();
            format!("{}: {}", region.region_name(), cells.join(" | "))
        })
        .collect()
}
