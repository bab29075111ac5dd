pub mod chatgpt;

use async_trait::async_trait;

/// How the model should answer: with a visible reasoning trace or straight to the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Mode {
    #[default]
    Think,
    Concise,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Think => Mode::Concise,
            Mode::Concise => Mode::Think,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Think => "step-by-step",
            Mode::Concise => "concise",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// Empty when the model produced no reasoning block.
    pub reasoning: String,
    pub answer: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("language model backend error: {0}")]
    Backend(String),

    #[error("language model returned an empty completion")]
    EmptyCompletion,
}

impl From<::chatgpt::err::Error> for GenerationError {
    fn from(err: ::chatgpt::err::Error) -> Self {
        GenerationError::Backend(err.to_string())
    }
}

/// Black-box text generation service. Everything above this trait only
/// depends on the (reasoning, answer) contract.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        mode: Mode,
        language: &str,
    ) -> Result<Generation, GenerationError>;
}

/// Splits raw model output into reasoning and answer on the last `</think>` marker.
pub fn split_reasoning(output: &str) -> Generation {
    let output = output.trim_end();
    let output = output.strip_suffix("</s>").unwrap_or(output);

    match output.rsplit_once("</think>") {
        Some((reasoning, answer)) => {
            let reasoning = reasoning.trim_start();
            let reasoning = reasoning.strip_prefix("<think>").unwrap_or(reasoning);
            Generation {
                reasoning: reasoning.trim_end_matches('\n').trim().to_string(),
                answer: answer.trim_start_matches('\n').trim().to_string(),
            }
        }
        None => Generation {
            reasoning: String::new(),
            answer: output.trim().to_string(),
        },
    }
}

/// Final user-facing text for a generation.
pub fn render_generation(generation: &Generation, mode: Mode) -> String {
    if mode == Mode::Think && !generation.reasoning.is_empty() {
        return format!(
            "🧠 Reasoning:\n{}\n\n✅ Answer:\n{}",
            generation.reasoning, generation.answer
        );
    }
    generation.answer.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_think_block_from_answer() {
        let generation = split_reasoning("<think>\nadd the digits\n</think>\n\nThe sum is 15</s>");
        assert_eq!(generation.reasoning, "add the digits");
        assert_eq!(generation.answer, "The sum is 15");
    }

    #[test]
    fn output_without_marker_is_all_answer() {
        let generation = split_reasoning("Diwali is the festival of lights.");
        assert!(generation.reasoning.is_empty());
        assert_eq!(generation.answer, "Diwali is the festival of lights.");
    }

    #[test]
    fn reasoning_is_only_shown_in_think_mode() {
        let generation = Generation {
            reasoning: "because".to_string(),
            answer: "42".to_string(),
        };
        assert_eq!(
            render_generation(&generation, Mode::Think),
            "🧠 Reasoning:\nbecause\n\n✅ Answer:\n42"
        );
        assert_eq!(render_generation(&generation, Mode::Concise), "42");

        let bare = Generation {
            reasoning: String::new(),
            answer: "42".to_string(),
        };
        assert_eq!(render_generation(&bare, Mode::Think), "42");
    }

    #[test]
    fn client_errors_become_backend_errors() {
        let err = GenerationError::from(::chatgpt::err::Error::BackendError {
            message: "quota exceeded".to_string(),
            error_type: "insufficient_quota".to_string(),
        });
        match err {
            GenerationError::Backend(message) => {
                assert!(message.contains("quota exceeded"));
                assert!(message.contains("insufficient_quota"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
