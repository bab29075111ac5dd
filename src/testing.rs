//! In-memory stand-ins for the model and the network services.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{split_reasoning, Generation, GenerationError, Mode, TextGenerator};
use crate::tools::{Article, Encyclopedia, ToolError, WebSearch};

pub const ECHO_REASONING: &str = "thinking it over";

pub fn article(title: &str, summary: &str, extra: &str) -> Article {
    let content = if extra.is_empty() {
        summary.to_string()
    } else {
        format!("{}\n\n{}", summary, extra)
    };
    Article {
        title: title.to_string(),
        url: format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_")),
        summary: summary.to_string(),
        content,
    }
}

enum Entry {
    Page(Article),
    Ambiguous(Vec<String>),
}

/// Titles match when one of the query's longer words appears in them.
#[derive(Default)]
pub struct FakeEncyclopedia {
    entries: Vec<(String, Entry)>,
    offline: bool,
}

impl FakeEncyclopedia {
    pub fn offline() -> Self {
        Self {
            entries: Vec::new(),
            offline: true,
        }
    }

    pub fn with_article(mut self, article: Article) -> Self {
        self.entries.push((article.title.clone(), Entry::Page(article)));
        self
    }

    pub fn with_disambiguation(mut self, title: &str, options: &[&str]) -> Self {
        let options = options.iter().map(|o| o.to_string()).collect();
        self.entries.push((title.to_string(), Entry::Ambiguous(options)));
        self
    }

    fn matches(title: &str, query: &str) -> bool {
        let title = title.to_lowercase();
        query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| word.chars().count() >= 4)
            .any(|word| title.contains(word))
    }
}

#[async_trait]
impl Encyclopedia for FakeEncyclopedia {
    async fn search(
        &self,
        query: &str,
        _language: &str,
        limit: usize,
    ) -> Result<Vec<String>, ToolError> {
        if self.offline {
            return Err(ToolError::Network("encyclopedia offline".to_string()));
        }
        Ok(self
            .entries
            .iter()
            .map(|(title, _)| title)
            .filter(|title| Self::matches(title, query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn page(&self, title: &str, _language: &str) -> Result<Article, ToolError> {
        if self.offline {
            return Err(ToolError::Network("encyclopedia offline".to_string()));
        }
        match self.entries.iter().find(|(t, _)| t == title) {
            Some((_, Entry::Page(article))) => Ok(article.clone()),
            Some((title, Entry::Ambiguous(options))) => Err(ToolError::Disambiguation {
                title: title.clone(),
                options: options.clone(),
            }),
            None => Err(ToolError::NotFound(title.to_string())),
        }
    }
}

/// Returns the same result text for every query and remembers what was asked.
pub struct FakeWebSearch {
    response: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl FakeWebSearch {
    pub fn returning(text: &str) -> Self {
        Self {
            response: Some(text.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn offline() -> Self {
        Self {
            response: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for FakeWebSearch {
    async fn search(&self, query: &str) -> Result<String, ToolError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.response
            .clone()
            .ok_or_else(|| ToolError::Network("web search offline".to_string()))
    }
}

/// Answers with the prompt itself, so tests can inspect what reached the model.
#[derive(Default)]
pub struct EchoGenerator {
    calls: Mutex<Vec<(String, Mode)>>,
}

impl EchoGenerator {
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    pub fn modes(&self) -> Vec<Mode> {
        self.calls.lock().unwrap().iter().map(|(_, mode)| *mode).collect()
    }
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(
        &self,
        prompt: &str,
        mode: Mode,
        _language: &str,
    ) -> Result<Generation, GenerationError> {
        self.calls.lock().unwrap().push((prompt.to_string(), mode));
        Ok(Generation {
            reasoning: ECHO_REASONING.to_string(),
            answer: prompt.to_string(),
        })
    }
}

/// Plays back raw model outputs in order, repeating the last one once the script runs out.
pub struct ScriptedGenerator {
    replies: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _mode: Mode,
        _language: &str,
    ) -> Result<Generation, GenerationError> {
        let mut prompts = self.prompts.lock().unwrap();
        let reply = self
            .replies
            .get(prompts.len())
            .or_else(|| self.replies.last())
            .cloned()
            .ok_or(GenerationError::EmptyCompletion)?;
        prompts.push(prompt.to_string());
        Ok(split_reasoning(&reply))
    }
}

pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _mode: Mode,
        _language: &str,
    ) -> Result<Generation, GenerationError> {
        Err(GenerationError::Backend("model unavailable".to_string()))
    }
}
