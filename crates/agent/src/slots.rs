//! Slot extraction: party size, time and guest name from free text.
//!
//! Each extractor is an ordered list of independent matchers. Order matters
//! because earlier patterns shadow later, more general ones.

use std::num::IntErrorKind;

use once_cell::sync::Lazy;
use regex::Regex;

const PARTY_SIZE_PATTERNS: &[&str] = &[
    r"(?i)(\d+)\s*(?:people|person|guest|pax|of us)",
    r"(?i)(?:for|party of)\s*(\d+)",
    r"^(\d+)$",
    r"(?i)table for (\d+)",
];

const NAME_FILLERS: &[&str] =
    &["my name is", "i'm", "i am", "it's", "its", "call me", "under", "name"];

static PARTY_SIZE_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    PARTY_SIZE_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("party size pattern compiles"))
        .collect()
});

static TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2})(?::(\d{2}))?\s*(am|pm)").expect("time pattern compiles")
});

static NAME_FILLER_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    NAME_FILLERS
        .iter()
        .map(|phrase| {
            Regex::new(&format!("(?i){}", regex::escape(phrase))).expect("filler pattern compiles")
        })
        .collect()
});

const NUMBER_WORDS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct SlotExtractor;

impl SlotExtractor {
    pub fn new() -> Self {
        Self
    }

    /// The first matching pattern decides; a zero capture counts as not found
    /// rather than falling through to later patterns. Counts too large for
    /// `u32` saturate so they still read as an oversized party.
    pub fn extract_party_size(&self, text: &str) -> Option<u32> {
        if let Some(captures) =
            PARTY_SIZE_REGEXES.iter().find_map(|pattern| pattern.captures(text))
        {
            return captures
                .get(1)
                .and_then(|digits| saturating_count(digits.as_str()))
                .filter(|size| *size > 0);
        }

        let lowered = text.to_lowercase();
        NUMBER_WORDS.iter().find(|(word, _)| lowered.contains(word)).map(|(_, size)| *size)
    }

    /// Normalizes to `H:MM AM|PM`, else looks for a bookable slot label with
    /// spaces ignored.
    pub fn extract_time(&self, text: &str, slots: &[String]) -> Option<String> {
        if let Some(captures) = TIME_REGEX.captures(text) {
            let hour = captures.get(1).and_then(|hour| hour.as_str().parse::<u32>().ok())?;
            let minute = captures.get(2).map(|minute| minute.as_str()).unwrap_or("00");
            let meridiem = captures.get(3).map(|m| m.as_str().to_uppercase())?;
            return Some(format!("{hour}:{minute} {meridiem}"));
        }

        let compact = text.to_lowercase().replace(' ', "");
        slots
            .iter()
            .find(|slot| compact.contains(&slot.to_lowercase().replace(' ', "")))
            .cloned()
    }

    /// Strips filler phrases anywhere in the text, then title-cases each word.
    /// May return an empty string.
    pub fn extract_name(&self, text: &str) -> String {
        let stripped = NAME_FILLER_REGEXES
            .iter()
            .fold(text.to_owned(), |name, filler| filler.replace_all(&name, "").into_owned());
        let trimmed = stripped.trim().trim_matches(|ch| matches!(ch, ',' | '.' | '!' | '?'));

        trimmed.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ")
    }
}

fn saturating_count(digits: &str) -> Option<u32> {
    match digits.parse::<u32>() {
        Ok(count) => Some(count),
        Err(error) if *error.kind() == IntErrorKind::PosOverflow => Some(u32::MAX),
        Err(_) => None,
    }
}

/// First character upper-cased, the rest lower-cased.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use once_cell::sync::Lazy;

    use super::{
        capitalize, SlotExtractor, NAME_FILLERS, NAME_FILLER_REGEXES, PARTY_SIZE_PATTERNS,
        PARTY_SIZE_REGEXES, TIME_REGEX,
    };

    fn slots() -> Vec<String> {
        tablemate_core::catalog::default_time_slots()
    }

    #[test]
    fn party_size_patterns_in_order() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_party_size("table for 4 people"), Some(4));
        assert_eq!(extractor.extract_party_size("party of 6"), Some(6));
        assert_eq!(extractor.extract_party_size("3"), Some(3));
        assert_eq!(extractor.extract_party_size("5 guests tonight"), Some(5));
        assert_eq!(extractor.extract_party_size("we are 12 pax"), Some(12));
    }

    #[test]
    fn party_size_falls_back_to_number_words() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_party_size("two of us"), Some(2));
        assert_eq!(extractor.extract_party_size("Just Three"), Some(3));
        assert_eq!(extractor.extract_party_size("a few friends"), None);
    }

    #[test]
    fn zero_party_size_is_not_found() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_party_size("0 people"), None);
        assert_eq!(extractor.extract_party_size("0"), None);
    }

    #[test]
    fn every_pattern_compiles() {
        assert_eq!(PARTY_SIZE_REGEXES.len(), PARTY_SIZE_PATTERNS.len());
        assert_eq!(NAME_FILLER_REGEXES.len(), NAME_FILLERS.len());
        Lazy::force(&TIME_REGEX);
    }

    #[test]
    fn oversized_party_counts_saturate() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_party_size("99999999999"), Some(u32::MAX));
        assert_eq!(
            extractor.extract_party_size("table for 123456789012345678901234567890 people"),
            Some(u32::MAX)
        );
        assert_eq!(extractor.extract_party_size("4294967295"), Some(u32::MAX));
    }

    #[test]
    fn time_is_normalized() {
        let extractor = SlotExtractor::new();
        assert_eq!(extractor.extract_time("7pm", &slots()).as_deref(), Some("7:00 PM"));
        assert_eq!(extractor.extract_time("around 8:30 pm", &slots()).as_deref(), Some("8:30 PM"));
        assert_eq!(extractor.extract_time("07AM", &slots()).as_deref(), Some("7:00 AM"));
    }

    #[test]
    fn time_falls_back_to_slot_labels() {
        let extractor = SlotExtractor::new();
        let slots = vec!["Early seating".to_owned(), "Late seating".to_owned()];
        assert_eq!(
            extractor.extract_time("the lateseating please", &slots).as_deref(),
            Some("Late seating")
        );
        assert_eq!(extractor.extract_time("whenever", &slots), None);
    }

    #[test]
    fn name_fillers_are_stripped_and_words_capitalized() {
        let extractor = SlotExtractor::new();
        assert!(extractor.extract_name("I'm Alice").contains("Alice"));
        assert_eq!(extractor.extract_name("my name is jean-luc PICARD!"), "Jean-luc Picard");
        assert_eq!(extractor.extract_name("call me  bob."), "Bob");
        assert_eq!(extractor.extract_name("under Smith"), "Smith");
        assert_eq!(extractor.extract_name("name"), "");
    }

    #[test]
    fn capitalize_lowers_the_tail() {
        assert_eq!(capitalize("éMILE"), "Émile");
        assert_eq!(capitalize(""), "");
    }
}
