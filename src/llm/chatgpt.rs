use std::time::Duration;

use async_trait::async_trait;
use chatgpt::config::ChatGPTEngine;
use chatgpt::prelude::*;
use chatgpt::types::CompletionResponse;
use log::debug;

use crate::catalog;
use crate::llm::{split_reasoning, Generation, GenerationError, Mode, TextGenerator};

const THINK_INSTRUCTIONS: &str = "Before answering, think through the problem step by step inside <think></think> tags. After the closing </think> tag, write only the final answer.";
const CONCISE_INSTRUCTIONS: &str = "Answer directly and concisely, without showing intermediate reasoning.";

pub struct ChatGptGenerator {
    chat_gpt: ChatGPT,
}

impl ChatGptGenerator {
    pub fn new(api_key: &str, engine: ChatGPTEngine, timeout: Duration) -> Result<Self> {
        let mut chat_gpt = ChatGPT::new(api_key)?;

        chat_gpt.config.engine = engine;
        chat_gpt.config.timeout = timeout;

        Ok(Self { chat_gpt })
    }

    fn build_message(prompt: &str, mode: Mode, language: &str) -> String {
        let mut message = String::from(prompt);
        message.push_str("\n\n");
        message.push_str(match mode {
            Mode::Think => THINK_INSTRUCTIONS,
            Mode::Concise => CONCISE_INSTRUCTIONS,
        });
        if language != "en" {
            message.push_str(&format!(
                "\nRespond in {}.",
                catalog::language_name(language)
            ));
        }
        message
    }
}

#[async_trait]
impl TextGenerator for ChatGptGenerator {
    async fn generate(
        &self,
        prompt: &str,
        mode: Mode,
        language: &str,
    ) -> std::result::Result<Generation, GenerationError> {
        let message = Self::build_message(prompt, mode, language);
        debug!(
            "Sending {} chars to the model ({} mode, language {})",
            message.len(),
            mode.label(),
            language
        );

        let response: CompletionResponse = self.chat_gpt.send_message(message).await?;
        let content = response.message().clone().content;

        debug!("Completion: {:?}", content);

        if content.trim().is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }
        Ok(split_reasoning(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn think_mode_asks_for_reasoning_tags() {
        let message = ChatGptGenerator::build_message("What is 2 + 2?", Mode::Think, "en");
        assert!(message.starts_with("What is 2 + 2?"));
        assert!(message.contains("<think></think>"));
        assert!(!message.contains("Respond in"));
    }

    #[test]
    fn non_english_language_adds_reply_language() {
        let message = ChatGptGenerator::build_message("Diwali?", Mode::Concise, "hi");
        assert!(message.contains("Respond in Hindi."));
        assert!(!message.contains("<think>"));
    }
}
