//! Arithmetic help for math questions.
//!
//! Expressions are evaluated by a small parser that only knows numbers and
//! `+ - * /`; nothing extracted from user text is ever executed.

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::tools::{split_sentences, ToolOutcome, WebSearch};

static ARITHMETIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?\s*[+\-*/]\s*\d+(?:\.\d+)?(?:\s*[+\-*/]\s*\d+(?:\.\d+)?)*)")
        .expect("arithmetic pattern is valid")
});
static MATH_TERMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"equation|solve|integrate|derivative|calculus|algebra|geometry|trigonometry|differentiate|simplify|factor")
        .expect("math terms pattern is valid")
});
static NOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[+\-*/^=]|\d+").expect("notation pattern is valid"));

const METHOD_WORDS: [&str; 5] = ["formula", "equation", "solution", "calculate", "solve"];
const MAX_APPROACHES: usize = 3;

pub const NO_ASSISTANCE: &str = "Unable to find specific computational assistance for this math problem. The LLM can solve this based on its mathematical knowledge.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    #[error("no arithmetic expression found")]
    NoExpression,

    #[error("unexpected '{0}' in expression")]
    UnexpectedToken(char),

    #[error("expression ends where a number was expected")]
    UnexpectedEnd,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(char),
}

fn tokenize(expression: &str) -> Result<Vec<Token>, MathError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if !(d.is_ascii_digit() || d == '.') {
                        break;
                    }
                    literal.push(d);
                    chars.next();
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| MathError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            other => return Err(MathError::UnexpectedToken(other)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        token
    }

    fn peek_op(&self) -> Option<char> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn number(&mut self) -> Result<f64, MathError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Op(op)) => Err(MathError::UnexpectedToken(op)),
            None => Err(MathError::UnexpectedEnd),
        }
    }

    fn term(&mut self) -> Result<f64, MathError> {
        let mut value = self.number()?;
        while let Some(op @ ('*' | '/')) = self.peek_op() {
            self.pos += 1;
            let rhs = self.number()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(MathError::DivisionByZero);
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn expression(&mut self) -> Result<f64, MathError> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek_op() {
            self.pos += 1;
            let rhs = self.term()?;
            if op == '+' {
                value += rhs;
            } else {
                value -= rhs;
            }
        }
        Ok(value)
    }
}

/// Evaluates `+ - * /` over non-negative decimal literals with the usual precedence.
pub fn evaluate(expression: &str) -> Result<f64, MathError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(MathError::NoExpression);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expression()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(value),
        Some(Token::Op(op)) => Err(MathError::UnexpectedToken(*op)),
        Some(Token::Number(_)) => Err(MathError::UnexpectedToken(' ')),
    }
}

/// First arithmetic sub-expression in the text, with whitespace removed.
pub fn extract_expression(text: &str) -> Option<String> {
    ARITHMETIC
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace()).collect())
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let rounded = format!("{:.6}", value);
        rounded.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// `"Arithmetic calculation: 5+10 = 15"` for the first expression in the problem.
pub fn calculate(problem: &str) -> Result<String, MathError> {
    let expression = extract_expression(problem).ok_or(MathError::NoExpression)?;
    let value = evaluate(&expression)?;
    Ok(format!(
        "Arithmetic calculation: {} = {}",
        expression,
        format_number(value)
    ))
}

fn relevant_approaches(search_results: &str) -> Option<String> {
    let sentences = split_sentences(search_results)
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            NOTATION.is_match(sentence) && METHOD_WORDS.iter().any(|word| lower.contains(word))
        })
        .take(MAX_APPROACHES)
        .collect::<Vec<_>>();

    if sentences.is_empty() {
        return None;
    }
    Some(format!(
        "Relevant mathematical approaches:\n- {}",
        sentences.join("\n- ")
    ))
}

async fn search_methodology(web: &dyn WebSearch, problem: &str) -> Option<String> {
    let lower = problem.to_lowercase();
    let terms = MATH_TERMS
        .find_iter(&lower)
        .map(|m| m.as_str())
        .collect::<Vec<_>>();
    debug!("Extracted math terms: {:?}", terms);
    if terms.is_empty() {
        return None;
    }

    match web
        .search(&format!("{} solution method mathematical", problem))
        .await
    {
        Ok(results) if results.chars().count() > 100 => relevant_approaches(&results),
        Ok(_) => None,
        Err(err) => {
            warn!("Error in math problem search: {}", err);
            None
        }
    }
}

/// Computational context for a math question: a methodology excerpt from the
/// web and/or the value of the first arithmetic expression.
pub async fn solve_math_problem(web: &dyn WebSearch, problem: &str) -> ToolOutcome {
    info!("solve_math_problem called with problem: {}", problem);

    let approaches = search_methodology(web, problem).await;
    let calculation = match calculate(problem) {
        Ok(calculation) => {
            info!("Performed arithmetic calculation: {}", calculation);
            Some(calculation)
        }
        Err(MathError::NoExpression) => None,
        Err(err) => {
            warn!("Error in arithmetic calculation: {}", err);
            None
        }
    };

    let parts = approaches
        .into_iter()
        .chain(calculation)
        .collect::<Vec<_>>();
    if parts.is_empty() {
        return ToolOutcome::Empty;
    }
    ToolOutcome::Text(parts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWebSearch;

    #[test]
    fn evaluates_with_precedence() {
        assert_eq!(evaluate("5+10"), Ok(15.0));
        assert_eq!(evaluate("2+3*4"), Ok(14.0));
        assert_eq!(evaluate("20-6/3"), Ok(18.0));
        assert_eq!(evaluate("1.5*4"), Ok(6.0));
        assert_eq!(evaluate("8/0"), Err(MathError::DivisionByZero));
        assert_eq!(evaluate("2+"), Err(MathError::UnexpectedEnd));
        assert_eq!(evaluate("2**3"), Err(MathError::UnexpectedToken('*')));
    }

    #[test]
    fn rejects_anything_but_arithmetic() {
        assert_eq!(
            evaluate("__import__('os')"),
            Err(MathError::UnexpectedToken('_'))
        );
        assert_eq!(evaluate("(1+2)"), Err(MathError::UnexpectedToken('(')));
        assert_eq!(evaluate(""), Err(MathError::NoExpression));
    }

    #[test]
    fn extracts_first_expression_only() {
        assert_eq!(extract_expression("What is 5 + 10?").as_deref(), Some("5+10"));
        assert_eq!(
            extract_expression("Solve: 234 + 567 - 1 then 9*9").as_deref(),
            Some("234+567-1")
        );
        assert_eq!(extract_expression("What is the LCM of 15 and 25?"), None);
    }

    #[test]
    fn formats_whole_numbers_without_fraction() {
        assert_eq!(format_number(15.0), "15");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(10.0 / 3.0), "3.333333");
    }

    #[tokio::test]
    async fn simple_sum_is_calculated() {
        let web = FakeWebSearch::offline();
        let outcome = solve_math_problem(&web, "What is 5 + 10?").await;
        let text = outcome.text().expect("calculation");
        assert!(text.contains("15"));
        assert_eq!(text, "Arithmetic calculation: 5+10 = 15");
        assert!(web.queries().is_empty(), "no math terms, no search");
    }

    #[tokio::test]
    async fn methodology_excerpt_is_combined_with_calculation() {
        let web = FakeWebSearch::returning(
            "Quadratic equations. The formula x = (-b ± sqrt(b^2 - 4ac)) / 2a gives the solution. \
             Completing the square is another way to solve 2x + 3 = 7. Unrelated trivia about mathematicians.",
        );
        let outcome = solve_math_problem(&web, "Solve the equation 2x + 3 = 7, and check 4 + 3").await;
        let text = outcome.text().unwrap();
        assert!(text.starts_with("Relevant mathematical approaches:\n- "));
        assert!(text.contains("The formula x"));
        assert!(!text.contains("trivia"));
        assert!(text.ends_with("\n\nArithmetic calculation: 4+3 = 7"));
        assert_eq!(
            web.queries(),
            vec!["Solve the equation 2x + 3 = 7, and check 4 + 3 solution method mathematical"]
        );
    }

    #[tokio::test]
    async fn nothing_found_is_empty() {
        let web = FakeWebSearch::offline();
        let outcome = solve_math_problem(&web, "Solve for the meaning of life").await;
        assert!(matches!(outcome, ToolOutcome::Empty));
        assert_eq!(outcome.or_fallback(|| NO_ASSISTANCE.to_string()), NO_ASSISTANCE);
    }
}
