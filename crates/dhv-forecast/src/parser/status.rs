//! Safety signal classification from marker classes and inline symbols.

use crate::types::Status;

/// Map a single marker class to a signal, ignoring case and an `fa-` icon prefix.
pub fn marker_status(marker: &str) -> Option<Status> {
    let marker = marker.trim().to_ascii_lowercase();
    let marker = marker.strip_prefix("fa-").unwrap_or(&marker);
    match marker {
        "good" | "thumbs-up" | "thumbsup" => Some(Status::Good),
        "bad" | "thumbs-down" | "thumbsdown" => Some(Status::Bad),
        "caution" | "exclamation" | "exclamation-triangle" | "warning" => Some(Status::Caution),
        _ => None,
    }
}

fn symbol_status(c: char) -> Option<Status> {
    match c {
        '👍' => Some(Status::Good),
        '👎' => Some(Status::Bad),
        '⚠' | '❗' => Some(Status::Caution),
        _ => None,
    }
}

/// Classify a day from its markers, falling back to inline symbols in `text`.
///
/// Markers always beat the text fallback. Within either source the strongest signal wins.
pub fn classify<S: AsRef<str>>(markers: &[S], text: &str) -> Status {
    let from_markers = strongest(markers.iter().filter_map(|m| marker_status(m.as_ref())));
    if let Some(status) = from_markers {
        return status;
    }
    strongest(text.chars().filter_map(symbol_status)).unwrap_or_default()
}

fn strongest(signals: impl Iterator<Item = Status>) -> Option<Status> {
    signals.reduce(Status::strongest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_MARKERS: [&str; 0] = [];

    #[test]
    fn test_marker_vocabulary() {
        assert_eq!(marker_status("thumbs-up"), Some(Status::Good));
        assert_eq!(marker_status("fa-thumbs-down"), Some(Status::Bad));
        assert_eq!(marker_status("Exclamation"), Some(Status::Caution));
        assert_eq!(marker_status("fa-exclamation-triangle"), Some(Status::Caution));
        assert_eq!(marker_status("good"), Some(Status::Good));
        assert_eq!(marker_status("bad"), Some(Status::Bad));
        assert_eq!(marker_status("caution"), Some(Status::Caution));
        assert_eq!(marker_status("col-12"), None);
        assert_eq!(marker_status("fa"), None);
    }

    #[test]
    fn test_bad_beats_good_in_any_order() {
        assert_eq!(classify(&["bad", "good"], ""), Status::Bad);
        assert_eq!(classify(&["good", "bad"], ""), Status::Bad);
    }

    #[test]
    fn test_full_priority_table() {
        let cases: [(&[&str], Status); 8] = [
            (&["good"], Status::Good),
            (&["caution"], Status::Caution),
            (&["bad"], Status::Bad),
            (&["good", "caution"], Status::Caution),
            (&["caution", "good"], Status::Caution),
            (&["caution", "bad"], Status::Bad),
            (&["bad", "caution", "good"], Status::Bad),
            (&["lead", "text-muted"], Status::None),
        ];
        for (markers, expected) in cases {
            assert_eq!(classify(markers, ""), expected, "markers {:?}", markers);
        }
    }

    #[test]
    fn test_no_markers_yields_none() {
        assert_eq!(classify(&NO_MARKERS, "Sonnig, Basis 2500m"), Status::None);
    }

    #[test]
    fn test_text_fallback_only_without_markers() {
        assert_eq!(classify(&NO_MARKERS, "Gute Bedingungen 👍"), Status::Good);
        assert_eq!(classify(&NO_MARKERS, "👍 vormittags, ⚠ Gewitter ab Mittag"), Status::Caution);
        assert_eq!(classify(&["good"], "⚠ Gewitter 👎"), Status::Good);
    }
}
