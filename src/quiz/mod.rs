use std::fmt;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::llm::{GenerationError, Mode, TextGenerator};

static ANSWER_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:correct\s+)?answer:[ \t]*\(?([A-D])\b")
        .expect("answer key pattern is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("could not generate a question: {0}")]
    Generation(#[from] GenerationError),

    #[error("the generated question has no 'Answer: X' line, so it cannot be graded")]
    MissingAnswerKey,

    #[error("the generated reply has an answer key but no question")]
    EmptyQuestion,
}

/// One multiple-choice question waiting for an answer in a chat.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuizState {
    pub exam: String,
    pub subject: String,
    /// Question and options, without the answer line.
    pub question: String,
    pub correct: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect { correct: char },
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Correct => write!(f, "✅ Correct!"),
            Verdict::Incorrect { correct } => write!(f, "❌ Incorrect. Correct answer: {}", correct),
        }
    }
}

fn question_prompt(exam: &str, subject: &str) -> String {
    format!(
        "Generate a {} question for {} exam. Provide 4 options labelled A) to D) and finish with a line 'Answer: X' naming the correct option.",
        subject, exam
    )
}

/// Parses the correct letter from the last `Answer: X` line. When text precedes
/// that line it is the question, and anything after the key (usually an
/// explanation) is dropped; a key on the first line is removed on its own.
pub fn parse_question(exam: &str, subject: &str, text: &str) -> Result<QuizState, QuizError> {
    let captures = ANSWER_KEY
        .captures_iter(text)
        .last()
        .ok_or(QuizError::MissingAnswerKey)?;
    let key = captures.get(0).ok_or(QuizError::MissingAnswerKey)?;
    let correct = captures
        .get(1)
        .and_then(|m| m.as_str().chars().next())
        .ok_or(QuizError::MissingAnswerKey)?
        .to_ascii_uppercase();

    let line_end = text[key.end()..]
        .find('\n')
        .map_or(text.len(), |offset| key.end() + offset);
    let before = text[..key.start()].trim();
    let question = if before.is_empty() {
        text[line_end..].trim()
    } else {
        before
    };
    if question.is_empty() {
        return Err(QuizError::EmptyQuestion);
    }

    Ok(QuizState {
        exam: exam.to_string(),
        subject: subject.to_string(),
        question: question.to_string(),
        correct,
    })
}

pub async fn start(
    generator: &dyn TextGenerator,
    exam: &str,
    subject: &str,
    language: &str,
) -> Result<QuizState, QuizError> {
    info!("Starting quiz for {} {} in {}", exam, subject, language);
    let generation = generator
        .generate(&question_prompt(exam, subject), Mode::Think, language)
        .await?;

    parse_question(exam, subject, &generation.answer).map_err(|err| {
        warn!("Unusable quiz question ({}): {:?}", err, generation.answer);
        err
    })
}

impl QuizState {
    /// Grades an answer; whitespace and letter case are ignored.
    pub fn submit(&self, answer: &str) -> Verdict {
        if answer.trim().to_uppercase() == self.correct.to_string() {
            Verdict::Correct
        } else {
            Verdict::Incorrect {
                correct: self.correct,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingGenerator, ScriptedGenerator};

    const QUESTION: &str = "Q: Which river is called the Sorrow of Bihar?\nA) Ganga\nB) Kosi\nC) Son\nD) Gandak\nAnswer: b";

    fn state() -> QuizState {
        parse_question("UPSC", "Geography", QUESTION).unwrap()
    }

    #[test]
    fn answer_key_is_uppercased_and_hidden() {
        let quiz = state();
        assert_eq!(quiz.correct, 'B');
        assert!(quiz.question.ends_with("D) Gandak"));
        assert!(!quiz.question.contains("Answer"));
    }

    #[test]
    fn submit_ignores_case_and_whitespace() {
        let quiz = state();
        assert_eq!(quiz.submit(" b "), Verdict::Correct);
        assert_eq!(quiz.submit("B"), Verdict::Correct);
        assert_eq!(quiz.submit("b"), Verdict::Correct);
        assert_eq!(quiz.submit("C"), Verdict::Incorrect { correct: 'B' });
        assert_eq!(quiz.submit("C").to_string(), "❌ Incorrect. Correct answer: B");
        assert_eq!(Verdict::Correct.to_string(), "✅ Correct!");
    }

    #[test]
    fn key_on_first_line_is_removed() {
        let quiz = parse_question(
            "UPSC",
            "Geography",
            "Answer: B\nQ: Sorrow of Bihar?\nA) Ganga\nB) Kosi\nC) Son\nD) Gandak",
        )
        .unwrap();
        assert_eq!(quiz.correct, 'B');
        assert_eq!(quiz.question, "Q: Sorrow of Bihar?\nA) Ganga\nB) Kosi\nC) Son\nD) Gandak");
    }

    #[test]
    fn inline_answer_phrase_is_not_the_key() {
        let text = "Q: Pick the correct answer: Delhi is the capital of India?\nA) True\nB) False\nC) Only since 1931\nD) None\nAnswer: A\nExplanation: Delhi became the capital in 1911.";
        let quiz = parse_question("SSC", "General Awareness", text).unwrap();
        assert_eq!(quiz.correct, 'A');
        assert!(quiz.question.starts_with("Q: Pick the correct answer: Delhi is the capital"));
        assert!(quiz.question.ends_with("D) None"));
        assert!(!quiz.question.contains("Explanation"));
    }

    #[test]
    fn key_alone_is_not_a_question() {
        assert!(matches!(
            parse_question("GATE", "Algorithms", "Answer: (C)"),
            Err(QuizError::EmptyQuestion)
        ));
    }

    #[test]
    fn question_without_key_is_rejected() {
        let result = parse_question("JEE", "Physics", "Q: What is g?\nA) 9.8\nB) 10");
        assert!(matches!(result, Err(QuizError::MissingAnswerKey)));
    }

    #[tokio::test]
    async fn start_strips_reasoning_block() {
        let generator = ScriptedGenerator::new(&[
            "<think>Kosi floods often.</think>\nQ: Sorrow of Bihar?\nA) Ganga\nB) Kosi\nC) Son\nD) Gandak\nAnswer: B",
        ]);
        let quiz = start(&generator, "UPSC", "Geography", "hi").await.unwrap();
        assert_eq!(quiz.correct, 'B');
        assert!(quiz.question.starts_with("Q: Sorrow of Bihar?"));
        assert!(generator.prompts()[0].starts_with("Generate a Geography question for UPSC exam."));
    }

    #[tokio::test]
    async fn generation_failure_is_reported() {
        let result = start(&FailingGenerator, "NEET", "Biology", "en").await;
        assert!(matches!(result, Err(QuizError::Generation(_))));
    }
}
