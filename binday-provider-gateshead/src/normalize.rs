//! Lookup tables that turn raw link labels into canonical waste types and colours.

/// Colour reported for labels missing from the colour table.
pub const UNKNOWN_COLOUR: &str = "unknown";

const ONLY_SUFFIX: &str = " only";

/// Short names used in link text, mapped to their canonical label.
const SHORT_NAMES: [(&str, &str); 2] = [
    ("Household", "Household Waste"),
    ("Garden", "Garden Waste"),
];

/// Canonical label to bin colour.
const BIN_COLOURS: [(&str, &str); 4] = [
    ("Household Waste", "green"),
    ("Garden Waste", "garden"),
    ("Recycling - Glass, plastic and cans", "dark blue"),
    ("Recycling - Paper and cardboard", "light blue with red top"),
];

/// Remove a trailing `" only"` (any case) from a label.
#[must_use]
pub fn strip_only_suffix(label: &str) -> &str {
    let trimmed = label.trim();
    let split = trimmed
        .len()
        .checked_sub(ONLY_SUFFIX.len())
        .and_then(|at| Some((trimmed.get(..at)?, trimmed.get(at..)?)));

    match split {
        Some((head, tail)) if tail.eq_ignore_ascii_case(ONLY_SUFFIX) => head.trim(),
        _ => trimmed,
    }
}

/// Normalize raw link text into the canonical waste label.
///
/// Unknown labels pass through unchanged apart from suffix stripping.
#[must_use]
pub fn canonical_label(raw: &str) -> String {
    let stripped = strip_only_suffix(raw);
    SHORT_NAMES
        .iter()
        .find(|(short, _)| *short == stripped)
        .map_or(stripped, |&(_, canonical)| canonical)
        .to_owned()
}

/// Colour of the bin for a canonical label, or [`UNKNOWN_COLOUR`].
#[must_use]
pub fn display_colour(canonical: &str) -> &'static str {
    BIN_COLOURS
        .iter()
        .find(|(label, _)| *label == canonical)
        .map_or(UNKNOWN_COLOUR, |&(_, colour)| colour)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_suffix_is_removed_in_any_case() {
        assert_eq!(
            canonical_label("Recycling - Paper and cardboard only"),
            "Recycling - Paper and cardboard"
        );
        assert_eq!(canonical_label("Garden ONLY"), "Garden Waste");
        assert_eq!(strip_only_suffix("x only"), "x");
        assert_eq!(strip_only_suffix("Lonely"), "Lonely");
    }

    #[test]
    fn bare_only_label_is_kept() {
        assert_eq!(strip_only_suffix(" only"), "only");
        assert_eq!(canonical_label("Only"), "Only");
    }

    #[test]
    fn short_names_expand() {
        assert_eq!(canonical_label("Household"), "Household Waste");
        assert_eq!(canonical_label("Garden"), "Garden Waste");
        assert_eq!(canonical_label("Household Waste"), "Household Waste");
    }

    #[test]
    fn colours_follow_canonical_labels() {
        assert_eq!(display_colour(&canonical_label("Household")), "green");
        assert_eq!(display_colour(&canonical_label("Garden")), "garden");
        assert_eq!(
            display_colour(&canonical_label("Recycling - Paper and cardboard only")),
            "light blue with red top"
        );
        assert_eq!(
            display_colour("Recycling - Glass, plastic and cans"),
            "dark blue"
        );
        assert_eq!(display_colour("Bulky Waste"), UNKNOWN_COLOUR);
    }

    #[test]
    fn multibyte_labels_do_not_panic() {
        assert_eq!(canonical_label("Ünly"), "Ünly");
        assert_eq!(canonical_label("Glas – only"), "Glas –");
    }
}
