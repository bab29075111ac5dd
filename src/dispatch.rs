//! Routes a question to a tool-augmentation strategy and asks the model for the reply.
//!
//! Every tool here is best effort: whatever fails simply adds nothing to the
//! prompt. The only error a caller ever sees is the apology string produced
//! when the model itself fails.

use std::sync::Arc;

use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::agent::{CodeAgent, DEFAULT_MAX_STEPS};
use crate::catalog;
use crate::llm::{render_generation, GenerationError, Mode, TextGenerator};
use crate::prompts::{format_prompt, Category};
use crate::tools::code::{analyze_code, extract_code_block};
use crate::tools::culture::explain_cultural_concept;
use crate::tools::exam::{check_exam_syllabus, exam_question_generator, Difficulty};
use crate::tools::math::solve_math_problem;
use crate::tools::wikipedia::search_wikipedia;
use crate::tools::{contains_any, truncate_chars, Encyclopedia, ToolOutcome, WebSearch};

static RESOURCE_MENTIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[^.!?]*(?:book|reference|material|resource)[^.!?]*[.!?]")
        .expect("resource pattern is valid")
});

const RECENCY_WORDS: [&str; 6] = ["latest", "current", "news", "today", "recently", "trending"];
const SOLVE_WORDS: [&str; 6] = ["solve", "calculate", "find", "compute", "evaluate", "simplify"];
const REVIEW_WORDS: [&str; 3] = ["analyze", "review", "improve"];
const SYLLABUS_WORDS: [&str; 5] = ["syllabus", "curriculum", "topics", "pattern", "preparation"];
const QA_SYLLABUS_WORDS: [&str; 4] = ["syllabus", "curriculum", "topics", "pattern"];
const RESOURCE_WORDS: [&str; 5] = ["books", "reference", "material", "resources", "study"];

const RECENT_INFO_CHARS: usize = 1500;
const MAX_RESOURCE_MENTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Culture,
    Math,
    Code,
    Exam,
    Default,
}

pub struct BranchRule {
    pub branch: Branch,
    pub category: Category,
    /// Lowercase; an empty list means the rule only fires on its category.
    pub keywords: &'static [&'static str],
}

/// Evaluated top to bottom; the first matching row wins, `Default` otherwise.
pub const BRANCH_TABLE: [BranchRule; 4] = [
    BranchRule {
        branch: Branch::Culture,
        category: Category::Culture,
        keywords: &["festival", "tradition", "history", "culture", "heritage"],
    },
    BranchRule {
        branch: Branch::Math,
        category: Category::MathLogic,
        keywords: &["solve", "equation", "calculate", "math", "problem", "formula"],
    },
    BranchRule {
        branch: Branch::Code,
        category: Category::Code,
        keywords: &["code", "function", "program", "algorithm", "class", "implement"],
    },
    BranchRule {
        branch: Branch::Exam,
        category: Category::Exam,
        keywords: &[],
    },
];

pub fn select_branch(category: Category, query: &str) -> Branch {
    BRANCH_TABLE
        .iter()
        .find(|rule| rule.category == category || contains_any(query, rule.keywords))
        .map(|rule| rule.branch)
        .unwrap_or(Branch::Default)
}

#[derive(Debug, Clone)]
pub struct Request {
    pub category: Category,
    pub query: String,
    pub mode: Mode,
    pub language: String,
    pub use_tools: bool,
}

pub struct Dispatcher {
    generator: Arc<dyn TextGenerator>,
    encyclopedia: Arc<dyn Encyclopedia>,
    web: Arc<dyn WebSearch>,
    http: reqwest::Client,
    wiki_language: String,
}

impl Dispatcher {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        encyclopedia: Arc<dyn Encyclopedia>,
        web: Arc<dyn WebSearch>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            generator,
            encyclopedia,
            web,
            http,
            wiki_language: "en".to_string(),
        }
    }

    /// Wikipedia edition used for direct article lookups.
    pub fn with_wiki_language(mut self, language: impl Into<String>) -> Self {
        self.wiki_language = language.into();
        self
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    async fn reply(&self, prompt: &str, mode: Mode, language: &str) -> String {
        match self.generator.generate(prompt, mode, language).await {
            Ok(generation) => render_generation(&generation, mode),
            Err(err) => {
                error!("Generation failed: {}", err);
                format!(
                    "Sorry, I encountered an error while processing your request: {}",
                    err
                )
            }
        }
    }

    /// Answers one chat message. Never fails; model errors become an apology.
    pub async fn answer(&self, request: &Request) -> String {
        let prompt = format_prompt(request.category, &request.query);
        if !request.use_tools {
            return self.reply(&prompt, request.mode, &request.language).await;
        }

        let branch = select_branch(request.category, &request.query);
        info!(
            "Dispatching {:?} request to the {:?} branch",
            request.category, branch
        );

        let context = match branch {
            Branch::Culture => self.culture_context(&request.query).await,
            Branch::Math => self.math_context(&request.query).await,
            Branch::Code => {
                if let Some(context) = self.code_review_context(&request.query).await {
                    context
                } else {
                    let agent = CodeAgent::new(
                        self.generator.clone(),
                        self.web.clone(),
                        self.http.clone(),
                        DEFAULT_MAX_STEPS,
                    );
                    if let Some(answer) = agent.run(&prompt).await {
                        return answer.trim().to_string();
                    }
                    String::new()
                }
            }
            Branch::Exam => self.exam_context(&request.query).await,
            Branch::Default => String::new(),
        };

        debug!("Augmentation adds {} chars", context.chars().count());
        self.reply(&format!("{}{}", prompt, context), request.mode, &request.language)
            .await
    }

    async fn culture_context(&self, query: &str) -> String {
        let mut context = String::new();

        let concept = query.replace('?', "");
        let facts = explain_cultural_concept(
            self.encyclopedia.as_ref(),
            self.web.as_ref(),
            concept.trim(),
            None,
        )
        .await;
        if let Some(facts) = facts.usable(50) {
            context.push_str(&format!(
                "\n\nFactual context to incorporate into your response:\n{}",
                facts
            ));
        }

        if contains_any(query, &RECENCY_WORDS) {
            let recent: ToolOutcome = self
                .web
                .search(&format!(
                    "Find the most recent and factual information about: {}",
                    query
                ))
                .await
                .into();
            if let Some(recent) = recent.usable(100) {
                context.push_str(&format!(
                    "\n\nRecent information to incorporate:\n{}",
                    truncate_chars(recent, RECENT_INFO_CHARS)
                ));
            }
        }
        context
    }

    async fn math_context(&self, query: &str) -> String {
        if !contains_any(query, &SOLVE_WORDS) {
            return String::new();
        }
        match solve_math_problem(self.web.as_ref(), query).await.usable(20) {
            Some(info) => format!("\n\nRelevant mathematical information:\n{}", info),
            None => String::new(),
        }
    }

    /// `None` unless the message asks for a review and carries a fenced block.
    async fn code_review_context(&self, query: &str) -> Option<String> {
        if !contains_any(query, &REVIEW_WORDS) {
            return None;
        }
        let block = extract_code_block(query)?;
        let report = analyze_code(self.web.as_ref(), &block.code, &block.language).await;
        Some(format!(
            "\n\nCode information and resources:\n{}",
            report.summary()
        ))
    }

    async fn exam_context(&self, query: &str) -> String {
        let mut context = String::new();
        let exam = catalog::find_exam(query);
        let subject = exam.and_then(|exam| catalog::find_subject(exam, query));
        let lower = query.to_lowercase();

        if contains_any(query, &SYLLABUS_WORDS) {
            if let Some(exam) = exam {
                let syllabus = check_exam_syllabus(
                    self.encyclopedia.as_ref(),
                    self.web.as_ref(),
                    exam,
                    subject,
                )
                .await;
                if let Some(syllabus) = syllabus.usable(50) {
                    context.push_str(&format!(
                        "\n\nSyllabus reference information:\n{}",
                        syllabus
                    ));
                }
            }
        }

        if contains_any(query, &RESOURCE_WORDS) {
            let results: ToolOutcome = self
                .web
                .search(&format!(
                    "recommended books reference materials for {}",
                    query
                ))
                .await
                .into();
            if let Some(results) = results.usable(100) {
                let mentions = RESOURCE_MENTIONS
                    .find_iter(results)
                    .map(|m| m.as_str().trim())
                    .take(MAX_RESOURCE_MENTIONS)
                    .collect::<Vec<_>>();
                if !mentions.is_empty() {
                    context.push_str(&format!("\n\nReference materials:\n{}", mentions.join(" ")));
                }
            }
        }

        if lower.contains("generate") && (lower.contains("question") || lower.contains("mock")) {
            if let (Some(exam), Some(subject)) = (exam, subject) {
                let question_context = exam_question_generator(
                    self.encyclopedia.as_ref(),
                    exam,
                    subject,
                    Difficulty::Medium,
                )
                .await;
                if let Some(question_context) = question_context.usable(50) {
                    context.push_str(&format!(
                        "\n\nQuestion generation context:\n{}",
                        question_context
                    ));
                }
            }
        }
        context
    }

    async fn concise_answer(&self, prompt: &str, language: &str) -> Result<String, GenerationError> {
        self.generator
            .generate(prompt, Mode::Concise, language)
            .await
            .map(|generation| generation.answer)
    }

    async fn syllabus_context(&self, exam: &str, subject: &str) -> Option<String> {
        check_exam_syllabus(
            self.encyclopedia.as_ref(),
            self.web.as_ref(),
            exam,
            Some(subject),
        )
        .await
        .usable(50)
        .map(str::to_string)
    }

    pub async fn syllabus_overview(&self, exam: &str, subject: &str) -> String {
        let mut prompt = format!(
            "Provide a comprehensive overview of the syllabus for {} in {} examination. Include important topics, recommended approach to studying each topic, and focus areas.",
            subject, exam
        );
        if let Some(syllabus) = self.syllabus_context(exam, subject).await {
            prompt.push_str(&format!(
                "\n\nIncorporate this factual syllabus information in your response:\n{}",
                syllabus
            ));
        }
        self.concise_answer(&prompt, "en")
            .await
            .unwrap_or_else(|err| format!("Error retrieving syllabus: {}", err))
    }

    pub async fn study_tips(&self, exam: &str, subject: &str) -> String {
        let mut prompt = format!(
            "Provide effective study strategies and tips for preparing {} for the {} examination. Include time management advice, important focus areas, and common mistakes to avoid.",
            subject, exam
        );
        if let Some(syllabus) = self.syllabus_context(exam, subject).await {
            prompt.push_str(&format!(
                "\n\nIncorporate this exam information in your response:\n{}",
                syllabus
            ));
        }
        self.concise_answer(&prompt, "en")
            .await
            .unwrap_or_else(|err| format!("Error generating study tips: {}", err))
    }

    pub async fn exam_qa(&self, exam: &str, subject: &str, question: &str, language: &str) -> String {
        let mut context = String::new();
        if contains_any(question, &QA_SYLLABUS_WORDS) {
            if let Some(syllabus) = self.syllabus_context(exam, subject).await {
                context.push_str(&format!("\n\nSyllabus information:\n{}", syllabus));
            }
        }
        if context.is_empty() {
            let search_term = format!("{} {} {}", exam, subject, question);
            let wiki = search_wikipedia(self.encyclopedia.as_ref(), &search_term, &self.wiki_language).await;
            if let Some(wiki) = wiki.usable(100) {
                context.push_str(&format!("\n\nFactual information:\n{}", wiki));
            }
        }

        let mut prompt = format!(
            "As an expert in {} preparation, specifically for the subject {}, answer the following question in {}: {}",
            exam,
            subject,
            catalog::language_name(language),
            question
        );
        if !context.is_empty() {
            prompt.push_str(&format!(
                "\n\nIncorporate this factual information in your response:{}",
                context
            ));
        }
        self.concise_answer(&prompt, language)
            .await
            .unwrap_or_else(|err| format!("Error processing your question: {}", err))
    }

    pub async fn regional_query(&self, state: &str, topic: &str, language: &str, prompt: &str) -> String {
        let topic_lower = topic.to_lowercase();
        let search_query = format!("{} {}", state, topic_lower);
        let mut context = String::new();

        let wiki = search_wikipedia(self.encyclopedia.as_ref(), &search_query, &self.wiki_language).await;
        if let Some(wiki) = wiki.usable(100) {
            context.push_str(&format!(
                "\n\nFactual information about {}:\n{}",
                search_query, wiki
            ));
        }

        if context.chars().count() < 200 {
            let web: ToolOutcome = self
                .web
                .search(&format!("{} India authentic traditional", search_query))
                .await
                .into();
            if let Some(web) = web.usable(100) {
                context.push_str(&format!(
                    "\n\nAdditional information from web search:\n{}",
                    truncate_chars(web, RECENT_INFO_CHARS)
                ));
            }
        }

        let query = if prompt.trim().is_empty() {
            format!("Explain {} of {}", topic_lower, state)
        } else {
            prompt.trim().to_string()
        };
        let mut regional_prompt = format!(
            "You are Bharat AI Buddy, an assistant with deep expertise in Indian regional cultures and languages. \
             Provide a rich, detailed explanation about the {} of {} in {}. \
             Incorporate authentic local terms, traditions, and contexts. \
             If responding in an Indian language other than English, incorporate some authentic local terms \
             from that region while keeping the overall text understandable.\n\nQuery: {}",
            topic_lower,
            state,
            catalog::language_name(language),
            query
        );
        if !context.is_empty() {
            regional_prompt.push_str(&format!(
                "\n\nIncorporate these facts in your response:{}",
                context
            ));
        }

        match self.generator.generate(&regional_prompt, Mode::Think, language).await {
            Ok(generation) => {
                let mut response = String::new();
                if !generation.reasoning.is_empty() {
                    response.push_str(&format!(
                        "🧠 Analyzing regional information about {}:\n{}\n\n",
                        state, generation.reasoning
                    ));
                }
                response.push_str(&format!("✅ **{} {}**\n\n{}", state, topic, generation.answer));
                response.push_str(&format!(
                    "\n\n---\n*Answer grounded in regional context for {}.*",
                    state
                ));
                response
            }
            Err(err) => {
                error!("Regional generation failed: {}", err);
                format!("Error generating regional information: {}", err)
            }
        }
    }
}
