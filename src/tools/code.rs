use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tools::WebSearch;

static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(\w+)?[ \t]*\r?\n([\s\S]+?)\r?\n```").expect("code block pattern is valid")
});
static PYTHON_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^import\s+(\w+)|^from\s+(\w+)").expect("python import pattern is valid")
});
static JS_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:import\s+(?:[\w*{}\s,]+\s+from\s+)?|require\s*\(\s*)['"]([^'"]+)['"]"#)
        .expect("js import pattern is valid")
});
static RESOURCE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://[^\s)\]]+(?:\.org|\.com|\.io|\.dev)/[^\s)\]]+")
        .expect("url pattern is valid")
});

const MAX_DEPENDENCIES: usize = 10;
const MAX_CANDIDATE_URLS: usize = 5;
const QUALITY_TERMS: [&str; 6] = [
    "best-practices",
    "style-guide",
    "lint",
    "quality",
    "standards",
    "convention",
];

pub const LLM_NOTE: &str =
    "The LLM can perform detailed code analysis based on its knowledge of programming best practices.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeReport {
    pub language: String,
    pub code_length: usize,
    pub line_count: usize,
    pub dependencies: Vec<String>,
    pub notes: Vec<String>,
    pub resources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CodeReport {
    /// Plain-text summary appended to the prompt.
    pub fn summary(&self) -> String {
        let mut text = String::new();
        if !self.dependencies.is_empty() {
            text.push_str(&format!(
                "Dependencies detected: {}\n\n",
                self.dependencies.join(", ")
            ));
        }
        if !self.notes.is_empty() {
            text.push_str(&format!("Notes: {}\n\n", self.notes.join(" ")));
        }
        if !self.resources.is_empty() {
            text.push_str(&format!(
                "Relevant best practices resources:\n- {}",
                self.resources.join("\n- ")
            ));
        }
        text.trim_end().to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
}

/// First fenced block in the text; untagged blocks are taken as Python.
pub fn extract_code_block(text: &str) -> Option<CodeBlock> {
    let captures = CODE_BLOCK.captures(text)?;
    Some(CodeBlock {
        language: captures
            .get(1)
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_else(|| "python".to_string()),
        code: captures.get(2)?.as_str().to_string(),
    })
}

fn normalize_language(language: &str) -> &'static str {
    match language.to_lowercase().as_str() {
        "javascript" | "js" => "javascript",
        "typescript" | "ts" => "typescript",
        "rust" | "rs" => "rust",
        _ => "python",
    }
}

type PatternSet = Vec<(&'static str, Regex)>;

fn compile_patterns(patterns: &[&'static str]) -> PatternSet {
    patterns
        .iter()
        .map(|pattern| (*pattern, Regex::new(pattern).expect("unsafe pattern is valid")))
        .collect()
}

static PYTHON_UNSAFE: Lazy<PatternSet> = Lazy::new(|| {
    compile_patterns(&[
        r"eval\(",
        r"exec\(",
        r"os\.system\(",
        r"subprocess\.call\(",
        r"pickle\.loads\(",
    ])
});
static JS_UNSAFE: Lazy<PatternSet> = Lazy::new(|| {
    compile_patterns(&[
        r"eval\(",
        r"document\.write\(",
        r"\.innerHTML\s*=",
        r"new Function\(",
    ])
});
static RUST_UNSAFE: Lazy<PatternSet> =
    Lazy::new(|| compile_patterns(&[r"unsafe\s*\{", r"Command::new\(", r"mem::transmute"]));

fn unsafe_patterns(language: &str) -> &'static PatternSet {
    match normalize_language(language) {
        "javascript" | "typescript" => &JS_UNSAFE,
        "rust" => &RUST_UNSAFE,
        _ => &PYTHON_UNSAFE,
    }
}

pub fn find_dependencies(code: &str, language: &str) -> Vec<String> {
    let found: Vec<String> = match language.to_lowercase().as_str() {
        "python" | "py" => PYTHON_IMPORT
            .captures_iter(code)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string())
            .collect(),
        "javascript" | "js" | "typescript" | "ts" => JS_IMPORT
            .captures_iter(code)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect(),
        _ => Vec::new(),
    };

    let mut unique: Vec<String> = Vec::new();
    for dependency in found {
        if !unique.contains(&dependency) {
            unique.push(dependency);
        }
    }
    unique.truncate(MAX_DEPENDENCIES);
    unique
}

pub fn find_unsafe_patterns(code: &str, language: &str) -> Vec<String> {
    unsafe_patterns(language)
        .iter()
        .filter(|(_, regex)| regex.is_match(code))
        .map(|(pattern, _)| {
            warn!("Unsafe pattern detected in code: {}", pattern);
            format!("Found potentially unsafe pattern: {}", pattern)
        })
        .collect()
}

/// URLs from the search results that look like style or quality guides.
pub fn quality_resources(search_results: &str) -> Vec<String> {
    RESOURCE_URL
        .find_iter(search_results)
        .map(|m| m.as_str().to_string())
        .take(MAX_CANDIDATE_URLS)
        .filter(|url| {
            let url = url.to_lowercase();
            QUALITY_TERMS.iter().any(|term| url.contains(term))
        })
        .collect()
}

/// Static scan of a snippet plus best-practice links. Never fails; a failed search lands in `error`.
pub async fn analyze_code(web: &dyn WebSearch, code: &str, language: &str) -> CodeReport {
    info!("analyze_code called for {} code analysis", language);
    let mut report = CodeReport {
        language: language.to_string(),
        code_length: code.chars().count(),
        line_count: code.split('\n').count(),
        ..CodeReport::default()
    };

    report.dependencies = find_dependencies(code, language);
    debug!("Identified dependencies: {:?}", report.dependencies);

    report.notes.extend(find_unsafe_patterns(code, language));

    let query = format!("{} programming best practices code quality standards", language);
    match web.search(&query).await {
        Ok(results) => {
            report.resources = quality_resources(&results);
            debug!("Found relevant resources for code quality: {:?}", report.resources);
        }
        Err(err) => {
            warn!("Error searching for code quality resources: {}", err);
            report.error = Some(format!("Error searching for code quality resources: {}", err));
        }
    }

    report.notes.push(LLM_NOTE.to_string());
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWebSearch;

    const PYTHON_SNIPPET: &str = "import os\nfrom collections import Counter\nimport os\n\ndef run(cmd):\n    os.system(cmd)\n    return eval(cmd)";

    #[test]
    fn extracts_tagged_and_untagged_blocks() {
        let prompt = "Please review this:\n```js\nconst fs = require('fs');\n```\nthanks";
        assert_eq!(
            extract_code_block(prompt),
            Some(CodeBlock {
                language: "js".to_string(),
                code: "const fs = require('fs');".to_string(),
            })
        );

        let untagged = extract_code_block("analyze\n```\nprint(1)\nprint(2)\n```");
        assert_eq!(untagged.unwrap().language, "python");
        assert_eq!(extract_code_block("no code at all"), None);
    }

    #[test]
    fn python_dependencies_are_unique_and_ordered() {
        assert_eq!(
            find_dependencies(PYTHON_SNIPPET, "python"),
            vec!["os".to_string(), "collections".to_string()]
        );
        assert_eq!(
            find_dependencies("import x from \"react\";\nconst l = require('lodash');", "ts"),
            vec!["react".to_string(), "lodash".to_string()]
        );
    }

    #[test]
    fn flags_shell_and_eval_calls() {
        let notes = find_unsafe_patterns(PYTHON_SNIPPET, "python");
        assert_eq!(notes.len(), 2);
        assert!(notes[0].contains(r"eval\("));
        assert!(notes[1].contains(r"os\.system\("));

        let js = find_unsafe_patterns("el.innerHTML = input;", "javascript");
        assert_eq!(js.len(), 1);

        let rust = find_unsafe_patterns("let p = unsafe { *ptr };", "rs");
        assert_eq!(rust, vec![r"Found potentially unsafe pattern: unsafe\s*\{".to_string()]);
        assert!(find_unsafe_patterns("print('ok')", "python").is_empty());
    }

    #[test]
    fn keeps_only_quality_links() {
        let results = "[PEP 8](https://peps.python.org/pep-0008/)\n\
                       [Guide](https://google.github.io/styleguide/pyguide.html)\n\
                       [Lint](https://docs.astral.sh/ruff/linter/)\n\
                       [Best](https://realpython.com/python-code-quality/)";
        assert_eq!(
            quality_resources(results),
            vec!["https://realpython.com/python-code-quality/".to_string()]
        );
    }

    #[tokio::test]
    async fn report_survives_search_failure() {
        let web = FakeWebSearch::offline();
        let report = analyze_code(&web, PYTHON_SNIPPET, "python").await;
        assert_eq!(report.line_count, 7);
        assert_eq!(report.dependencies.len(), 2);
        assert!(report.resources.is_empty());
        assert_eq!(report.notes.last().map(String::as_str), Some(LLM_NOTE));
        assert!(report
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("Error searching for code quality resources")));

        let summary = report.summary();
        assert!(summary.starts_with("Dependencies detected: os, collections\n\nNotes: "));
        assert!(!summary.contains("resources:"));
    }
}
