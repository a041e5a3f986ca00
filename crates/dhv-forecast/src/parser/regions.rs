//! Region anchors, region name normalization and region segmentation.

use std::collections::HashSet;

use dhv_core::RegionSetting;
use tracing::debug;

use super::blocks::{Block, BlockKind};
use super::date::{extract_day, header_day};

/// Loose text lines longer than this are never taken as region titles.
const MAX_TITLE_CHARS: usize = 60;

/// Substring → display code for the regions the page is known to carry.
const NAME_CODES: &[(&str, &str)] = &[
    ("deutschland", "DE"),
    ("nordalpen", "NA"),
    ("südalpen", "SA"),
    ("schweiz", "CH"),
    ("österreich", "AT"),
];

/// Map a raw region title to its short display name.
///
/// Unknown names fall back to their first character, never to an empty string.
pub fn normalize_region_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    if let Some((_, code)) = NAME_CODES.iter().find(|(name, _)| lowered.contains(name)) {
        return (*code).to_string();
    }

    let trimmed = raw.trim();
    let source = if trimmed.is_empty() { raw } else { trimmed };
    source
        .chars()
        .next()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// One region the segmenter looks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionAnchor {
    pub anchor: String,
    pub code: Option<String>,
}

/// The ordered set of regions to extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTable {
    anchors: Vec<RegionAnchor>,
}

impl RegionTable {
    pub fn new(settings: &[RegionSetting]) -> Self {
        Self {
            anchors: settings
                .iter()
                .filter(|s| !s.anchor.trim().is_empty())
                .map(|s| RegionAnchor {
                    anchor: s.anchor.trim().to_string(),
                    code: s.code.clone(),
                })
                .collect(),
        }
    }

    pub fn from_anchors<I, S>(anchors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let settings: Vec<RegionSetting> = anchors.into_iter().map(RegionSetting::new).collect();
        Self::new(&settings)
    }

    /// Deutschland, Nordalpen, Südalpen
    pub fn dhv_default() -> Self {
        Self::from_anchors(["Deutschland", "Nordalpen", "Südalpen"])
    }

    pub fn anchors(&self) -> &[RegionAnchor] {
        &self.anchors
    }
}

/// A located region and the blocks belonging to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionBlock<'a> {
    /// Title text as it appears in the document
    pub raw_name: String,
    /// Normalized display name
    pub name: String,
    pub blocks: &'a [Block],
}

fn mentions(block: &Block, needle: &str) -> bool {
    block.text.to_lowercase().contains(needle)
}

/// Day headers mention places too; they never anchor a region.
fn is_title_heading(block: &Block) -> bool {
    block.kind == BlockKind::Heading && header_day(&block.text).is_none()
}

fn is_title_line(block: &Block) -> bool {
    block.kind == BlockKind::Text
        && block.text.chars().count() <= MAX_TITLE_CHARS
        && extract_day(&block.text).is_none()
        && !block.text.to_ascii_lowercase().contains("wind:")
}

/// Claim one block per anchor, in table order, among blocks accepted by `is_title`.
fn locate_all(
    blocks: &[Block],
    table: &RegionTable,
    is_title: impl Fn(&Block) -> bool,
) -> Vec<(usize, usize)> {
    let mut claimed = HashSet::new();
    let mut located = Vec::new();

    for (region_idx, region) in table.anchors().iter().enumerate() {
        let needle = region.anchor.to_lowercase();
        let found = (0..blocks.len()).find(|i| {
            !claimed.contains(i) && is_title(&blocks[*i]) && mentions(&blocks[*i], &needle)
        });
        if let Some(block_idx) = found {
            claimed.insert(block_idx);
            located.push((region_idx, block_idx));
        }
    }
    located
}

/// Split the document's blocks into region blocks, in table order.
///
/// Regions whose anchor is missing are left out. Each block runs from just after
/// its anchor to just before the next located anchor in document order.
/// Short text lines only serve as anchors on pages where no heading does.
pub fn segment_regions<'a>(blocks: &'a [Block], table: &RegionTable) -> Vec<RegionBlock<'a>> {
    let mut located = locate_all(blocks, table, is_title_heading);
    if located.is_empty() {
        located = locate_all(blocks, table, is_title_line);
    }
    for (region_idx, region) in table.anchors().iter().enumerate() {
        if !located.iter().any(|&(r, _)| r == region_idx) {
            debug!(anchor = %region.anchor, "Region anchor not found");
        }
    }

    let mut starts: Vec<usize> = located.iter().map(|&(_, b)| b).collect();
    starts.sort_unstable();

    located
        .into_iter()
        .map(|(region_idx, block_idx)| {
            let end = starts
                .iter()
                .copied()
                .find(|&s| s > block_idx)
                .unwrap_or(blocks.len());
            let region = &table.anchors()[region_idx];
            let raw_name = blocks[block_idx].text.clone();
            let name = region
                .code
                .clone()
                .unwrap_or_else(|| normalize_region_name(&raw_name));
            RegionBlock {
                raw_name,
                name,
                blocks: &blocks[block_idx + 1..end],
            }
        })
        .collect()
}
