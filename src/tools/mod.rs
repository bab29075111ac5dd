pub mod code;
pub mod culture;
pub mod exam;
pub mod math;
pub mod summary;
pub mod web;
pub mod wikipedia;

use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("nothing found for '{0}'")]
    NotFound(String),

    #[error("'{title}' is ambiguous")]
    Disambiguation { title: String, options: Vec<String> },
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ToolError::Status(status.as_u16()),
            None => ToolError::Network(err.to_string()),
        }
    }
}

/// Result of one best-effort tool call.
///
/// Only `Text` ever reaches a prompt; `Empty` and `Failed` both contribute nothing.
#[derive(Debug)]
pub enum ToolOutcome {
    Text(String),
    Empty,
    Failed(ToolError),
}

impl ToolOutcome {
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            ToolOutcome::Empty
        } else {
            ToolOutcome::Text(text)
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ToolOutcome::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Text longer than `min_chars`, or nothing.
    pub fn usable(&self, min_chars: usize) -> Option<&str> {
        self.text().filter(|text| text.chars().count() > min_chars)
    }

    /// String form for direct display, replacing `Empty` and `Failed` with a fallback message.
    pub fn or_fallback(self, fallback: impl FnOnce() -> String) -> String {
        match self {
            ToolOutcome::Text(text) => text,
            ToolOutcome::Empty | ToolOutcome::Failed(_) => fallback(),
        }
    }
}

impl From<Result<String, ToolError>> for ToolOutcome {
    fn from(result: Result<String, ToolError>) -> Self {
        match result {
            Ok(text) => ToolOutcome::from_text(text),
            Err(err) => ToolOutcome::Failed(err),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Article {
    pub title: String,
    pub url: String,
    /// Lead section only.
    pub summary: String,
    /// Whole page as plain text, with `== Heading ==` section markers.
    pub content: String,
}

/// Reference source searched by title, e.g. Wikipedia.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    async fn search(
        &self,
        query: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<String>, ToolError>;

    /// Fails with `ToolError::Disambiguation` when the title names several articles.
    async fn page(&self, title: &str, language: &str) -> Result<Article, ToolError>;
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Rendered result list as markdown-ish text.
    async fn search(&self, query: &str) -> Result<String, ToolError>;
}

pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ToolError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(
            "BharatBuddyBot/",
            env!("CARGO_PKG_VERSION"),
            " (educational Telegram bot)"
        ))
        .build()
        .map_err(|e| ToolError::Network(e.to_string()))
}

/// Splits on sentence punctuation; pieces keep no terminator.
pub fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c| c == '.' || c == '!' || c == '?')
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
}

/// First `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().any(|needle| haystack.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_composition_only_keeps_long_enough_text() {
        let short = ToolOutcome::Text("tiny".to_string());
        let long = ToolOutcome::Text("x".repeat(60));
        let failed = ToolOutcome::Failed(ToolError::Network("offline".to_string()));

        assert_eq!(short.usable(20), None);
        assert_eq!(long.usable(50).map(str::len), Some(60));
        assert_eq!(failed.usable(0), None);
        assert_eq!(ToolOutcome::Empty.usable(0), None);
        assert!(matches!(ToolOutcome::from_text("  ".to_string()), ToolOutcome::Empty));
    }

    #[test]
    fn fallback_replaces_failures() {
        let failed = ToolOutcome::Failed(ToolError::Status(503));
        assert_eq!(failed.or_fallback(|| "fallback".to_string()), "fallback");
        let text = ToolOutcome::Text("found".to_string());
        assert_eq!(text.or_fallback(|| "fallback".to_string()), "found");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("दिवाली", 2), "दि");
        assert_eq!(truncate_chars("abc", 10), "abc");
        let sentences: Vec<_> = split_sentences("One. Two! Three?  ").collect();
        assert_eq!(sentences, vec!["One", "Two", "Three"]);
    }
}
