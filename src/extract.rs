use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::dictionary::MedicineDictionary;
use crate::dosage;
use crate::similarity;
use crate::stop_words;

pub const FUZZY_CUTOFF: f64 = 0.85;
pub const MIN_TOKEN_CHARS: usize = 3;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("word pattern is valid"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    pub detected_medicines: Vec<String>,
    pub detected_dosages: Vec<String>,
}

/// Runs both extractors over `text`, lowercasing it first.
pub fn analyze_text(text: &str, dictionary: &MedicineDictionary) -> ExtractionResult {
    let lowered = text.to_lowercase();
    ExtractionResult {
        detected_medicines: extract_medicines(&lowered, dictionary),
        detected_dosages: dosage::extract_dosages(&lowered),
    }
}

/// Medicine names found in `text`, display-cased, sorted and unique.
///
/// Each candidate token is looked up exactly first; only on a miss is the
/// whole dictionary scanned for the closest name. Multi-word entries are
/// searched as phrases over the full text independently of the tokens.
pub fn extract_medicines(text: &str, dictionary: &MedicineDictionary) -> Vec<String> {
    if dictionary.is_empty() {
        return Vec::new();
    }
    let text = text.to_lowercase();
    let mut detected = BTreeSet::new();

    for token in WORD_RE.find_iter(&text).map(|found| found.as_str()) {
        if token.chars().count() < MIN_TOKEN_CHARS || stop_words::is_stop_word(token) {
            continue;
        }
        if dictionary.contains(token) {
            detected.insert(capitalize(token));
            continue;
        }
        let names = dictionary.names().iter().map(String::as_str);
        if let Some(name) = similarity::closest_match(token, names, FUZZY_CUTOFF) {
            debug!("fuzzy matched {:?} to {:?}", token, name);
            detected.insert(title_case(name));
        }
    }

    for phrase in dictionary.multi_word() {
        if phrase.pattern.is_match(&text) {
            detected.insert(title_case(&phrase.name));
        }
    }

    detected.into_iter().collect()
}

/// First character uppercased, the rest lowercased.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Uppercases every cased character that follows an uncased one, so digits
/// and punctuation start a new word as well as spaces do.
pub fn title_case(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut previous_cased = false;
    for ch in value.chars() {
        if previous_cased {
            output.extend(ch.to_lowercase());
        } else {
            output.extend(ch.to_uppercase());
        }
        previous_cased = ch.is_alphabetic();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> MedicineDictionary {
        MedicineDictionary::from_names([
            "amoxicillin",
            "ibuprofen",
            "paracetamol",
            "zolax",
            "folic acid",
            "vitamin d3",
            "tablet",
            "ox",
        ])
    }

    #[test]
    fn exact_entries_are_found_among_padding() {
        let dictionary = dictionary();
        for name in dictionary.names() {
            if name.chars().count() < MIN_TOKEN_CHARS || stop_words::is_stop_word(name) {
                continue;
            }
            let text = format!("please dispense {} today", name);
            let found = extract_medicines(&text, &dictionary);
            assert!(
                found.contains(&title_case(name)) || found.contains(&capitalize(name)),
                "{name} not found in {found:?}"
            );
        }
    }

    #[test]
    fn short_tokens_and_stop_words_are_never_reported() {
        let found = extract_medicines("ox tablet ox tablet", &dictionary());
        assert!(found.is_empty(), "unexpected {found:?}");
    }

    #[test]
    fn single_substitution_in_long_name_is_tolerated() {
        let found = extract_medicines("Amoxicilin 500mg", &dictionary());
        assert_eq!(found, vec!["Amoxicillin"]);
        let found = extract_medicines("paracetanol", &dictionary());
        assert_eq!(found, vec!["Paracetamol"]);
    }

    #[test]
    fn double_substitution_in_short_name_is_rejected() {
        assert!(extract_medicines("zxlyx", &dictionary()).is_empty());
    }

    #[test]
    fn multi_word_entries_match_as_phrases() {
        let found = extract_medicines("Take FOLIC ACID and vitamin d3 daily", &dictionary());
        assert_eq!(found, vec!["Folic Acid", "Vitamin D3"]);
    }

    #[test]
    fn phrase_requires_word_boundaries() {
        assert!(extract_medicines("nonfolic acidic", &dictionary()).is_empty());
    }

    #[test]
    fn results_are_sorted_unique_and_stable() {
        let text = "ibuprofen amoxicillin IBUPROFEN amoxicilin";
        let first = extract_medicines(text, &dictionary());
        let second = extract_medicines(text, &dictionary());
        assert_eq!(first, vec!["Amoxicillin", "Ibuprofen"]);
        assert_eq!(first, second);
    }

    #[test]
    fn exact_hits_capitalize_and_fuzzy_hits_title_case() {
        let dictionary = MedicineDictionary::from_names(["zinc2go"]);
        let found = extract_medicines("zinc2go zinc2gx", &dictionary);
        assert_eq!(found, vec!["Zinc2Go", "Zinc2go"]);
    }

    #[test]
    fn empty_dictionary_never_matches() {
        let empty = MedicineDictionary::default();
        assert!(extract_medicines("amoxicillin 500mg folic acid", &empty).is_empty());
    }

    #[test]
    fn analyze_text_combines_both_extractors() {
        let result = analyze_text("IBUPROFEN 400 MG, Folic Acid 5mg", &dictionary());
        assert_eq!(result.detected_medicines, vec!["Folic Acid", "Ibuprofen"]);
        assert_eq!(result.detected_dosages, vec!["400 mg", "5mg"]);
    }

    #[test]
    fn display_casing() {
        assert_eq!(capitalize("amoxicillin"), "Amoxicillin");
        assert_eq!(capitalize("b12x"), "B12x");
        assert_eq!(title_case("b12x"), "B12X");
        assert_eq!(title_case("co-trimoxazole forte"), "Co-Trimoxazole Forte");
        assert_eq!(title_case(""), "");
    }
}
