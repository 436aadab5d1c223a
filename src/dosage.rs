use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

pub const DOSAGE_PATTERN: &str = r"\d+\s?(?:mg|ml|g|mcg)";

static DOSAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(DOSAGE_PATTERN).expect("dosage pattern is valid"));

/// Dosage strings exactly as they appear in `text`, which the caller has
/// already lowercased.
///
/// The result is ordered as strings, not by amount: "10mg" sorts before "2mg".
// TODO: order by numeric amount once clients stop relying on string order.
pub fn extract_dosages(text: &str) -> Vec<String> {
    DOSAGE_RE
        .find_iter(text)
        .map(|found| found.as_str().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_dosages_with_and_without_space() {
        assert_eq!(
            extract_dosages("take 500mg twice, 10 ml daily"),
            vec!["10 ml", "500mg"]
        );
    }

    #[test]
    fn orders_lexicographically_and_dedupes() {
        assert_eq!(
            extract_dosages("2mg now, 10mg later, 2mg again"),
            vec!["10mg", "2mg"]
        );
    }

    #[test]
    fn recognizes_every_unit() {
        assert_eq!(
            extract_dosages("1g 25mcg 5 mg 15ml"),
            vec!["15ml", "1g", "25mcg", "5 mg"]
        );
    }

    #[test]
    fn matches_are_verbatim_prefixes() {
        // The unit is not word-bounded, so "10 gtt" still yields "10 g".
        assert_eq!(extract_dosages("10 gtt"), vec!["10 g"]);
        assert!(extract_dosages("no dose here").is_empty());
        assert!(extract_dosages("500 MG").is_empty());
    }
}
