//! Summary / wind splitting of a day's text.

const WIND_MARKER: &str = "wind:";

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte offset of the first ASCII-case-insensitive `Wind:` in `text`.
fn find_wind_marker(text: &str) -> Option<usize> {
    text.char_indices().map(|(i, _)| i).find(|&i| {
        text.get(i..i + WIND_MARKER.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(WIND_MARKER))
    })
}

/// Split a day's text into `(summary_text, wind_text)`.
///
/// `summary_line` (the header text after the date) comes first, `body` second.
/// `wind_text` starts at the first `Wind:` marker and is empty when there is none.
pub fn compose(summary_line: &str, body: &str) -> (String, String) {
    let text = collapse_whitespace(&format!("{} {}", summary_line, body));
    match find_wind_marker(&text) {
        Some(idx) => (
            text[..idx].trim().to_string(),
            text[idx..].trim().to_string(),
        ),
        None => (text, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(compose("", ""), (String::new(), String::new()));
        assert_eq!(compose("   ", "\n\t"), (String::new(), String::new()));
    }

    #[test]
    fn test_summary_first_then_body() {
        let (summary, wind) = compose("Wolkig, leicht regnerisch", "Am Nachmittag Auflockerungen.");
        assert_eq!(summary, "Wolkig, leicht regnerisch Am Nachmittag Auflockerungen.");
        assert_eq!(wind, "");
    }

    #[test]
    fn test_wind_split() {
        let (summary, wind) = compose(
            "Hochdruck",
            "Gute Thermik bis 2500m.   Wind:  West 10km/h, in der Höhe 30km/h ",
        );
        assert_eq!(summary, "Hochdruck Gute Thermik bis 2500m.");
        assert_eq!(wind, "Wind: West 10km/h, in der Höhe 30km/h");
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        let (summary, wind) = compose("", "Föhnig. WIND: Süd stark");
        assert_eq!(summary, "Föhnig.");
        assert_eq!(wind, "WIND: Süd stark");
    }

    #[test]
    fn test_first_marker_wins() {
        let (_, wind) = compose("", "Wind: Nord. Später wind: Ost");
        assert_eq!(wind, "Wind: Nord. Später wind: Ost");
    }

    #[test]
    fn test_wind_without_colon_stays_in_summary() {
        let (summary, wind) = compose("", "Wenig Wind aus Nord");
        assert_eq!(summary, "Wenig Wind aus Nord");
        assert!(wind.is_empty());
    }

    #[test]
    fn test_wind_presence_matches_marker_presence() {
        let inputs = ["", "Wind:", "wInD: x", "Windig", "Ä wind: ö", "Rückenwind:"];
        for input in inputs {
            let (_, wind) = compose("", input);
            let has_marker = input.to_ascii_lowercase().contains("wind:");
            assert_eq!(!wind.is_empty(), has_marker, "input {:?}", input);
        }
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n b\t\tc  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }
}
