use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::extract_day;

/// Stored data that breaks the model's invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidForecast {
    #[error("not a day token: {0:?}")]
    DayToken(String),

    #[error("region {0:?} has no days")]
    NoDays(String),

    #[error("region name is empty")]
    EmptyRegionName,
}

/// Coarse flying-safety signal attached to a forecast day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Good,
    Bad,
    Caution,
    #[default]
    None,
}

impl Status {
    /// Position in the priority table; higher wins when several signals are present
    pub fn priority(self) -> u8 {
        match self {
            Self::Bad => 3,
            Self::Caution => 2,
            Self::Good => 1,
            Self::None => 0,
        }
    }

    /// The higher-priority of two signals
    pub fn strongest(self, other: Status) -> Status {
        if other.priority() > self.priority() {
            other
        } else {
            self
        }
    }

    /// Short label for display surfaces
    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Bad => "bad",
            Self::Caution => "caution",
            Self::None => "-",
        }
    }
}

/// A day token as printed on the page, e.g. `So. 07.12.2025` or `Mo 08.12.`
///
/// Only produced by the date extractor, so a value always holds a recognized token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DayToken(String);

impl DayToken {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The weekday abbreviation without its dot (`Mo`, `Di`, ...)
    pub fn weekday(&self) -> &str {
        self.0
            .split_whitespace()
            .next()
            .map(|w| w.trim_end_matches('.'))
            .unwrap_or("")
    }
}

impl TryFrom<String> for DayToken {
    type Error = InvalidForecast;

    /// Accepts exactly one recognized token, as the date extractor would produce it.
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match extract_day(&value) {
            Some(m) if m.start == 0 && m.token.as_str() == value => Ok(m.token),
            _ => Err(InvalidForecast::DayToken(value)),
        }
    }
}

impl From<DayToken> for String {
    fn from(token: DayToken) -> Self {
        token.0
    }
}

impl std::fmt::Display for DayToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One day of a region's forecast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayForecast {
    pub date: DayToken,
    pub summary_text: String,
    /// Empty when the page had no wind segment for the day
    #[serde(default)]
    pub wind_text: String,
    #[serde(default)]
    pub status: Status,
}

impl DayForecast {
    pub fn new(date: DayToken, summary_text: String, wind_text: String, status: Status) -> Self {
        Self {
            date,
            summary_text,
            wind_text,
            status,
        }
    }

    /// Summary and wind on separate lines, wind omitted when absent
    pub fn display_text(&self) -> String {
        if self.wind_text.is_empty() {
            self.summary_text.clone()
        } else {
            format!("{}\n{}", self.summary_text, self.wind_text)
        }
    }
}

/// A named region with at least one forecast day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRegion")]
pub struct RegionForecast {
    region_name: String,
    days: Vec<DayForecast>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRegion {
    region_name: String,
    days: Vec<DayForecast>,
}

impl TryFrom<RawRegion> for RegionForecast {
    type Error = InvalidForecast;

    fn try_from(raw: RawRegion) -> Result<Self, Self::Error> {
        if raw.region_name.is_empty() {
            return Err(InvalidForecast::EmptyRegionName);
        }
        if raw.days.is_empty() {
            return Err(InvalidForecast::NoDays(raw.region_name));
        }
        Ok(Self {
            region_name: raw.region_name,
            days: raw.days,
        })
    }
}

impl RegionForecast {
    /// Returns `None` for an empty day list; such regions are never part of a snapshot.
    pub fn new(region_name: impl Into<String>, days: Vec<DayForecast>) -> Option<Self> {
        if days.is_empty() {
            return None;
        }
        Some(Self {
            region_name: region_name.into(),
            days,
        })
    }

    pub fn region_name(&self) -> &str {
        &self.region_name
    }

    pub fn days(&self) -> &[DayForecast] {
        &self.days
    }
}

/// The complete result of one successful refresh
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    regions: Vec<RegionForecast>,
}

impl ForecastSnapshot {
    pub fn new(regions: Vec<RegionForecast>) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &[RegionForecast] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn region(&self, name: &str) -> Option<&RegionForecast> {
        self.regions.iter().find(|r| r.region_name == name)
    }

    pub fn day_count(&self) -> usize {
        self.regions.iter().map(|r| r.days.len()).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
