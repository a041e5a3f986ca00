//! Splits a region's blocks into day chunks and parses each chunk.

use tracing::debug;

use super::blocks::Block;
use super::compose::compose;
use super::date::{extract_day, header_day};
use super::status::classify;
use crate::types::DayForecast;

fn is_day_header(block: &Block) -> bool {
    !block.is_separator() && header_day(&block.text).is_some()
}

/// Slice `blocks` at separators and day headers. Each chunk runs to the next anchor.
fn split_chunks(blocks: &[Block]) -> Vec<&[Block]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    for (i, block) in blocks.iter().enumerate() {
        if i > start && (block.is_separator() || is_day_header(block)) {
            chunks.push(&blocks[start..i]);
            start = i;
        }
    }
    if start < blocks.len() {
        chunks.push(&blocks[start..]);
    }
    chunks
}

/// Parse one chunk. Chunks without a day token yield nothing.
fn parse_chunk(chunk: &[Block]) -> Option<DayForecast> {
    let content: Vec<&Block> = chunk.iter().filter(|b| !b.is_separator()).collect();

    let Some((pos, day)) = content
        .iter()
        .enumerate()
        .find_map(|(i, b)| extract_day(&b.text).map(|m| (i, m)))
    else {
        if !content.is_empty() {
            debug!(blocks = content.len(), "Skipping chunk without day token");
        }
        return None;
    };

    let header = content[pos];
    let summary_line = header.text[day.end..]
        .trim_start_matches(|c: char| c == ':' || c.is_whitespace());
    let body = content[pos + 1..]
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let markers: Vec<&str> = content[pos..]
        .iter()
        .flat_map(|b| b.markers.iter().map(String::as_str))
        .collect();
    let status = classify(&markers, &format!("{} {}", header.text, body));
    let (summary_text, wind_text) = compose(summary_line, &body);

    Some(DayForecast::new(day.token, summary_text, wind_text, status))
}

/// Parse all days of one region block, in document order.
pub fn segment_days(blocks: &[Block]) -> Vec<DayForecast> {
    split_chunks(blocks).into_iter().filter_map(parse_chunk).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;

    fn dates(days: &[DayForecast]) -> Vec<&str> {
        days.iter().map(|d| d.date.as_str()).collect()
    }

    #[test]
    fn test_heading_paragraph_pairs() {
        let blocks = vec![
            Block::heading("So. 07.12.2025: Wolkig, leicht regnerisch"),
            Block::text("Kaum fliegbar. Wind: Südwest 30km/h").with_markers(["thumbs-down"]),
            Block::heading("Mo. 08.12.2025: Sonnig"),
            Block::text("Gute Thermik bis 2200m.").with_markers(["thumbs-up"]),
        ];
        let days = segment_days(&blocks);

        assert_eq!(dates(&days), vec!["So. 07.12.2025", "Mo. 08.12.2025"]);
        assert_eq!(days[0].summary_text, "Wolkig, leicht regnerisch Kaum fliegbar.");
        assert_eq!(days[0].wind_text, "Wind: Südwest 30km/h");
        assert_eq!(days[0].status, Status::Bad);
        assert_eq!(days[1].summary_text, "Sonnig Gute Thermik bis 2200m.");
        assert_eq!(days[1].wind_text, "");
        assert_eq!(days[1].status, Status::Good);
    }

    #[test]
    fn test_separator_chunks_without_trailing_separator() {
        let blocks = vec![
            Block::text("Mo 08.12.: Hochdruck. Wind: Nord 10km/h"),
            Block::separator(),
            Block::text("Di 09.12.: Front zieht durch").with_markers(["exclamation"]),
        ];
        let days = segment_days(&blocks);

        assert_eq!(dates(&days), vec!["Mo 08.12.", "Di 09.12."]);
        assert_eq!(days[0].summary_text, "Hochdruck.");
        assert_eq!(days[0].wind_text, "Wind: Nord 10km/h");
        assert_eq!(days[0].status, Status::None);
        assert_eq!(days[1].status, Status::Caution);
    }

    #[test]
    fn test_chunk_without_date_is_skipped() {
        let blocks = vec![
            Block::text("Allgemeine Wetterlage: Tief über Skandinavien"),
            Block::separator(),
            Block::text("Keine Angaben"),
            Block::separator(),
            Block::heading("Mi 10.12.: Nebel"),
        ];
        let days = segment_days(&blocks);
        assert_eq!(dates(&days), vec!["Mi 10.12."]);
        assert_eq!(days[0].summary_text, "Nebel");
    }

    #[test]
    fn test_later_date_in_body_is_not_a_new_day() {
        let blocks = vec![
            Block::heading("Do 11.12.: Föhn"),
            Block::text("Die Aussichten ab Fr 12.12. bleiben unsicher."),
        ];
        let days = segment_days(&blocks);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].summary_text, "Föhn Die Aussichten ab Fr 12.12. bleiben unsicher.");
    }

    #[test]
    fn test_document_order_not_date_order() {
        let blocks = vec![
            Block::heading("Mi 10.12.: C"),
            Block::heading("Mo 08.12.: A"),
            Block::heading("Di 09.12.: B"),
        ];
        assert_eq!(
            dates(&segment_days(&blocks)),
            vec!["Mi 10.12.", "Mo 08.12.", "Di 09.12."]
        );
    }

    #[test]
    fn test_nested_unrelated_text_joins_body() {
        let blocks = vec![
            Block::separator(),
            Block::heading("Sa 13.12.: Schwacher Hochdruckeinfluss"),
            Block::text("Quelle: DHV"),
            Block::text("Wind: schwach"),
            Block::separator(),
        ];
        let days = segment_days(&blocks);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].summary_text, "Schwacher Hochdruckeinfluss Quelle: DHV");
        assert_eq!(days[0].wind_text, "Wind: schwach");
    }

    #[test]
    fn test_header_markers_count_towards_status() {
        let blocks = vec![
            Block::heading("So 14.12.: Gewitter").with_markers(["caution"]),
            Block::text("Nachmittags Überentwicklungen.").with_markers(["good"]),
        ];
        assert_eq!(segment_days(&blocks)[0].status, Status::Caution);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_days(&[]).is_empty());
        assert!(segment_days(&[Block::separator(), Block::separator()]).is_empty());
    }
}
