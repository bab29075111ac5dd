use once_cell::sync::Lazy;
use regex::Regex;

use crate::tools::{split_sentences, truncate_chars};

static DATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}[-/]\d{1,2}[-/]\d{2,4}\b|\b\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{2,4}\b")
        .expect("date pattern is valid")
});
static STATISTICS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d+(?:\.\d+)?%|\b\d+(?:,\d{3})+\b|₹\d+(?:,\d{3})*(?:\.\d+)?")
        .expect("statistics pattern is valid")
});
static CAPITALIZED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z]*(?:\s+[A-Z][a-zA-Z]*)*\b").expect("entity pattern is valid")
});

const KEY_WORDS: [&str; 9] = [
    "important",
    "significant",
    "crucial",
    "essential",
    "key",
    "main",
    "primary",
    "critical",
    "fundamental",
];
const MAX_LISTED: usize = 5;
const MAX_KEY_SENTENCES: usize = 2;

pub const DEFAULT_MAX_LENGTH: usize = 500;

/// Capitalized phrases seen more than once, most frequent first, ties in order of appearance.
fn repeated_entities(text: &str) -> Vec<&str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for entity in CAPITALIZED.find_iter(text).map(|m| m.as_str()) {
        match counts.iter_mut().find(|(seen, _)| *seen == entity) {
            Some((_, count)) => *count += 1,
            None => counts.push((entity, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_LISTED)
        .filter(|(entity, count)| entity.chars().count() > 1 && *count > 1)
        .map(|(entity, _)| entity)
        .collect()
}

/// Dates, figures, recurring names and flagged sentences from a long document, cut to `max_length` characters.
pub fn summarize_document(text: &str, max_length: usize) -> String {
    let mut extracted: Vec<String> = Vec::new();

    let dates = DATES
        .find_iter(text)
        .map(|m| m.as_str())
        .take(MAX_LISTED)
        .collect::<Vec<_>>();
    if !dates.is_empty() {
        extracted.push(format!("Dates mentioned: {}", dates.join(", ")));
    }

    let stats = STATISTICS
        .find_iter(text)
        .map(|m| m.as_str())
        .take(MAX_LISTED)
        .collect::<Vec<_>>();
    if !stats.is_empty() {
        extracted.push(format!("Key statistics: {}", stats.join(", ")));
    }

    let entities = repeated_entities(text);
    if !entities.is_empty() {
        extracted.push(format!("Key entities: {}", entities.join(", ")));
    }

    let key_sentences = split_sentences(text)
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            KEY_WORDS.iter().any(|word| lower.contains(word))
        })
        .take(MAX_KEY_SENTENCES)
        .collect::<Vec<_>>();
    if !key_sentences.is_empty() {
        extracted.push(format!("Key points: {}", key_sentences.join(" ")));
    }

    let result = extracted.join("\n\n");
    if result.chars().count() <= max_length {
        return result;
    }
    format!(
        "{}... (additional information available)",
        truncate_chars(&result, max_length)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "Chandrayaan Mission launched on 14 July 2023. \
        ISRO said the budget was ₹615 crore and 98.5% of goals were met. \
        The key result was a soft landing near the south pole. \
        Chandrayaan Mission data is shared with NASA. NASA praised ISRO and ISRO thanked NASA.";

    #[test]
    fn extracts_dates_figures_entities_and_key_points() {
        let summary = summarize_document(REPORT, DEFAULT_MAX_LENGTH);
        assert!(summary.starts_with("Dates mentioned: 14 July 2023\n\n"));
        assert!(summary.contains("Key statistics: "));
        assert!(summary.contains("98.5%"));
        assert!(summary.contains("Key entities: ISRO, NASA, Chandrayaan Mission"));
        assert!(summary.ends_with("Key points: The key result was a soft landing near the south pole"));
    }

    #[test]
    fn long_summaries_are_truncated_with_marker() {
        let summary = summarize_document(REPORT, 20);
        assert_eq!(summary, "Dates mentioned: 14 ... (additional information available)");
    }

    #[test]
    fn plain_text_yields_nothing() {
        assert_eq!(summarize_document("nothing notable here", 100), "");
    }
}
