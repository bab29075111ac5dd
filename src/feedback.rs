//! Ratings of answers, kept per language in a single JSON document.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::tools::truncate_chars;

const EXCERPT_CHARS: usize = 500;
const RECENT_ENTRIES: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("feedback file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("feedback file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
    pub response_excerpt: String,
    pub language: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageStats {
    pub count: u64,
    pub avg_rating: f64,
    /// Keyed "1" to "5".
    pub ratings: BTreeMap<String, u64>,
}

impl Default for LanguageStats {
    fn default() -> Self {
        Self {
            count: 0,
            avg_rating: 0.0,
            ratings: (1..=5).map(|r| (r.to_string(), 0)).collect(),
        }
    }
}

impl LanguageStats {
    fn record(&mut self, rating: u8) {
        self.count += 1;
        *self.ratings.entry(rating.to_string()).or_insert(0) += 1;

        let (weighted, total) = self
            .ratings
            .iter()
            .filter_map(|(r, n)| r.parse::<u64>().ok().map(|r| (r * n, *n)))
            .fold((0, 0), |(w, t), (rw, n)| (w + rw, t + n));
        self.avg_rating = if total == 0 {
            0.0
        } else {
            (weighted as f64 / total as f64 * 100.0).round() / 100.0
        };
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeedbackDocument {
    multilingual_feedback: Vec<FeedbackEntry>,
    language_stats: BTreeMap<String, LanguageStats>,
    created_at: DateTime<Utc>,
}

impl FeedbackDocument {
    fn new() -> Self {
        Self {
            multilingual_feedback: Vec::new(),
            language_stats: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackStats {
    pub language_stats: BTreeMap<String, LanguageStats>,
    pub total_feedback: usize,
    pub recent_feedback: Vec<FeedbackEntry>,
}

impl FeedbackStats {
    pub fn render(&self) -> String {
        if self.total_feedback == 0 {
            return "No feedback yet.".to_string();
        }
        let mut text = format!("📊 Feedback received: {}\n", self.total_feedback);
        for (language, stats) in &self.language_stats {
            text.push_str(&format!(
                "\n{}: {} ratings, average {:.2}",
                crate::catalog::language_name(language),
                stats.count,
                stats.avg_rating
            ));
        }
        text
    }
}

/// JSON file store. Writes from this process are serialized; other processes are not coordinated.
pub struct FeedbackStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FeedbackStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FeedbackError> {
        let path = path.into();
        if !path.exists() {
            info!("Creating feedback file at {}", path.display());
            write_document(&path, &FeedbackDocument::new())?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub async fn save(
        &self,
        prompt: &str,
        response: &str,
        language: &str,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<(), FeedbackError> {
        if !(1..=5).contains(&rating) {
            return Err(FeedbackError::InvalidRating(rating));
        }

        let _guard = self.lock.lock().await;
        let mut document = read_document(&self.path)?;

        let response_excerpt = if response.chars().count() > EXCERPT_CHARS {
            format!("{}...", truncate_chars(response, EXCERPT_CHARS))
        } else {
            response.to_string()
        };
        document.multilingual_feedback.push(FeedbackEntry {
            timestamp: Utc::now(),
            prompt: prompt.to_string(),
            response_excerpt,
            language: language.to_string(),
            rating,
            comment: comment.filter(|c| !c.trim().is_empty()).map(str::to_string),
        });
        document
            .language_stats
            .entry(language.to_string())
            .or_default()
            .record(rating);

        write_document(&self.path, &document)?;
        debug!("Saved rating {} for language {}", rating, language);
        Ok(())
    }

    pub async fn stats(&self) -> Result<FeedbackStats, FeedbackError> {
        let _guard = self.lock.lock().await;
        let document = read_document(&self.path)?;
        let total_feedback = document.multilingual_feedback.len();
        let recent_feedback = document
            .multilingual_feedback
            .into_iter()
            .skip(total_feedback.saturating_sub(RECENT_ENTRIES))
            .collect();
        Ok(FeedbackStats {
            language_stats: document.language_stats,
            total_feedback,
            recent_feedback,
        })
    }
}

fn read_document(path: &Path) -> Result<FeedbackDocument, FeedbackError> {
    if !path.exists() {
        return Ok(FeedbackDocument::new());
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_document(path: &Path, document: &FeedbackDocument) -> Result<(), FeedbackError> {
    let json = serde_json::to_string_pretty(document)?;
    fs::write(path, json)?;
    Ok(())
}
