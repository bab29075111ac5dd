//! Small action/observation loop that lets the model search, read pages and
//! scan code before it commits to an answer for programming requests.

use std::sync::Arc;

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::llm::{Mode, TextGenerator};
use crate::tools::code::{analyze_code, extract_code_block};
use crate::tools::summary::summarize_document;
use crate::tools::web::visit_webpage;
use crate::tools::{truncate_chars, WebSearch};

static ACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*Action:\s*([\w-]+)").expect("action pattern is valid"));
static INPUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?ms)^\s*Input:\s*(.+?)\s*\z").expect("input pattern is valid"));
static FINAL_ANSWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)Final Answer:\s*(.+)").expect("final answer pattern is valid"));

pub const DEFAULT_MAX_STEPS: usize = 12;

const OBSERVATION_CHARS: usize = 2000;
const PAGE_SUMMARY_CHARS: usize = 1500;

const PROTOCOL: &str = "You are a programming assistant that can use tools before answering.
Available tools:
- web_search: search the web. Input: a search query.
- visit_webpage: read a web page. Input: a URL.
- analyze_code: scan code for dependencies and unsafe patterns. Input: the code, optionally in a fenced block.

To use a tool, reply with exactly two lines:
Action: <tool name>
Input: <tool input>

When you are ready, reply with:
Final Answer: <your complete answer, including code>";

const FORMAT_REMINDER: &str = "Reply with either 'Action:' and 'Input:' lines or a 'Final Answer:'.";

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Act { tool: String, input: String },
    Finish(String),
    Malformed,
}

fn parse_step(reply: &str) -> Step {
    let action = ACTION.captures(reply).and_then(|c| c.get(1));
    let final_answer = FINAL_ANSWER.captures(reply).and_then(|c| c.get(1));

    match (action, final_answer) {
        (Some(action), final_answer)
            if final_answer.map_or(true, |answer| action.start() < answer.start()) =>
        {
            let after_action = &reply[action.end()..];
            let input = INPUT
                .captures(after_action)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Step::Act {
                tool: action.as_str().to_lowercase(),
                input,
            }
        }
        (_, Some(answer)) => Step::Finish(answer.as_str().trim().to_string()),
        _ => Step::Malformed,
    }
}

pub struct CodeAgent {
    generator: Arc<dyn TextGenerator>,
    web: Arc<dyn WebSearch>,
    http: reqwest::Client,
    max_steps: usize,
}

impl CodeAgent {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        web: Arc<dyn WebSearch>,
        http: reqwest::Client,
        max_steps: usize,
    ) -> Self {
        Self {
            generator,
            web,
            http,
            max_steps,
        }
    }

    async fn observe(&self, tool: &str, input: &str) -> String {
        let observation = match tool {
            "web_search" => match self.web.search(input).await {
                Ok(results) => results,
                Err(err) => format!("Error: {}", err),
            },
            "visit_webpage" => {
                let page = visit_webpage(&self.http, input.trim()).await;
                if page.starts_with("Error:") {
                    page
                } else {
                    let summary = summarize_document(&page, PAGE_SUMMARY_CHARS);
                    if summary.is_empty() {
                        page
                    } else {
                        summary
                    }
                }
            }
            "analyze_code" => {
                let (code, language) = match extract_code_block(input) {
                    Some(block) => (block.code, block.language),
                    None => (input.to_string(), "python".to_string()),
                };
                analyze_code(self.web.as_ref(), &code, &language).await.summary()
            }
            other => format!(
                "Unknown tool '{}'. Available tools: web_search, visit_webpage, analyze_code.",
                other
            ),
        };
        truncate_chars(&observation, OBSERVATION_CHARS).to_string()
    }

    /// Runs the loop for at most `max_steps` model calls. `None` when the
    /// model fails or never gives a final answer.
    pub async fn run(&self, task: &str) -> Option<String> {
        info!("Code agent started ({} steps max)", self.max_steps);
        let mut transcript = format!("{}\n\nTask: {}\n", PROTOCOL, task);

        for step in 1..=self.max_steps {
            let generation = match self.generator.generate(&transcript, Mode::Concise, "en").await {
                Ok(generation) => generation,
                Err(err) => {
                    warn!("Code agent generation failed at step {}: {}", step, err);
                    return None;
                }
            };

            match parse_step(&generation.answer) {
                Step::Finish(answer) => {
                    info!("Code agent finished after {} steps", step);
                    return Some(answer);
                }
                Step::Act { tool, input } => {
                    debug!("Code agent step {}: {} <- {:?}", step, tool, input);
                    let observation = self.observe(&tool, &input).await;
                    transcript.push_str(&format!(
                        "\nAction: {}\nInput: {}\nObservation: {}\n",
                        tool, input, observation
                    ));
                }
                Step::Malformed => {
                    debug!("Code agent step {}: reply did not follow the protocol", step);
                    transcript.push_str(&format!(
                        "\n{}\nObservation: {}\n",
                        generation.answer, FORMAT_REMINDER
                    ));
                }
            }
        }

        warn!("Code agent gave up after {} steps", self.max_steps);
        None
    }
}
