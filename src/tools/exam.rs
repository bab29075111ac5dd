//! Syllabus and question-generation context for Indian competitive exams.

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::tools::{truncate_chars, Article, Encyclopedia, ToolOutcome, WebSearch};

static SECTION_HEADINGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n== ([^=]+) ==").expect("section pattern is valid"));
static SUBSECTION_HEADINGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n=== ([^=]+) ===").expect("subsection pattern is valid"));
static LIST_ITEMS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\* ([^\n]+)|\n\d+\. ([^\n]+)").expect("list item pattern is valid")
});
static EXAM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:exam pattern|test pattern|examination pattern)([^.]+(?:\.[^.]+){0,3})")
        .expect("exam pattern is valid")
});
static MARKS_DISTRIBUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:weightage|marks distribution|subject distribution)([^.]+(?:\.[^.]+){0,2})")
        .expect("marks pattern is valid")
});

const MAX_POINTS: usize = 10;
const MAX_TOPICS: usize = 5;
const EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    fn guidance(&self, subject: &str) -> String {
        match self {
            Difficulty::Easy => format!("For an easy {} question, focus on basic definitions, straightforward applications, or simple calculations.", subject),
            Difficulty::Medium => format!("For a medium difficulty {} question, introduce multi-step problems or conceptual applications.", subject),
            Difficulty::Hard => format!("For a difficult {} question, combine multiple concepts, require deeper analysis, or use uncommon scenarios.", subject),
        }
    }
}

fn headings(regex: &Regex, text: &str) -> Vec<String> {
    regex
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

fn excerpt(text: &str) -> String {
    format!("{}...", truncate_chars(text, EXCERPT_CHARS))
}

fn subject_outline(content: &str, exam: &str, subject: &str) -> Vec<String> {
    let needle = subject.to_lowercase();
    for section in content.split("\n== ") {
        if !section.to_lowercase().contains(&needle) {
            continue;
        }
        // Headings regexes expect a leading newline.
        let section = format!("\n{}", section);

        let topics = headings(&SUBSECTION_HEADINGS, &section);
        if !topics.is_empty() {
            info!("Extracted key topics for {}: {:?}", subject, topics);
            return vec![
                format!("Key topics in {} for {}:", subject, exam),
                format!("- {}", topics.join("\n- ")),
            ];
        }

        let points = LIST_ITEMS
            .captures_iter(&section)
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().trim().to_string())
            .take(MAX_POINTS)
            .collect::<Vec<_>>();
        if !points.is_empty() {
            info!("Extracted key points for {}: {:?}", subject, points);
            return vec![
                format!("Key points in {} for {}:", subject, exam),
                format!("- {}", points.join("\n- ")),
            ];
        }
    }
    Vec::new()
}

fn syllabus_from_article(article: &Article, exam: &str, subject: Option<&str>) -> Vec<String> {
    let mut content = subject
        .map(|subject| subject_outline(&article.content, exam, subject))
        .unwrap_or_default();

    if content.is_empty() {
        let sections = headings(&SECTION_HEADINGS, &article.content);
        if !sections.is_empty() {
            content.push(format!("Main sections of {} syllabus:", exam));
            content.push(format!("- {}", sections.join("\n- ")));
        } else if article.summary.chars().count() > 500 {
            let first = article.summary.split('\n').next().unwrap_or_default();
            content.push(first.to_string());
        } else if !article.summary.is_empty() {
            content.push(article.summary.clone());
        }
    }
    content
}

fn subject_suffix(subject: Option<&str>) -> String {
    subject.map(|s| format!(" - {}", s)).unwrap_or_default()
}

pub fn syllabus_unavailable_message(exam: &str, subject: Option<&str>) -> String {
    let subject = subject.map(|s| format!(" ({})", s)).unwrap_or_default();
    format!(
        "Specific syllabus information for {}{} couldn't be retrieved. The LLM can proceed with its knowledge of this examination.",
        exam, subject
    )
}

/// Key syllabus sections for an exam, from Wikipedia structure and web-search exam-pattern phrases.
pub async fn check_exam_syllabus(
    encyclopedia: &dyn Encyclopedia,
    web: &dyn WebSearch,
    exam: &str,
    subject: Option<&str>,
) -> ToolOutcome {
    info!("check_exam_syllabus called for exam: {}, subject: {:?}", exam, subject);

    let official = if exam.to_lowercase().contains("upsc") {
        "official "
    } else {
        ""
    };
    let mut search_query = format!("{} {}syllabus", exam, official);
    if let Some(subject) = subject {
        search_query.push(' ');
        search_query.push_str(subject);
    }

    let mut content: Vec<String> = Vec::new();
    let mut source = String::new();

    match encyclopedia.search(&search_query, "en", 2).await {
        Ok(titles) => {
            debug!("Wikipedia search results for syllabus: {:?}", titles);
            if let Some(title) = titles.first() {
                match encyclopedia.page(title, "en").await {
                    Ok(article) => {
                        let title = article.title.to_lowercase();
                        if title.contains(&exam.to_lowercase()) || title.contains("syllabus") {
                            source = format!("Wikipedia: {}", article.url);
                            content.extend(syllabus_from_article(&article, exam, subject));
                        }
                    }
                    Err(err) => warn!("Error in Wikipedia syllabus extraction: {}", err),
                }
            }
        }
        Err(err) => warn!("Error searching Wikipedia for syllabus: {}", err),
    }

    match web.search(&format!("{} official", search_query)).await {
        Ok(results) if results.chars().count() > 150 => {
            let pattern = EXAM_PATTERN.captures(&results).and_then(|c| c.get(1));
            if let Some(pattern) = pattern {
                content.push(format!("Exam pattern: {}", pattern.as_str().trim()));
            }
            let marks = MARKS_DISTRIBUTION.captures(&results).and_then(|c| c.get(1));
            if let Some(marks) = marks {
                content.push(format!("Marks distribution: {}", marks.as_str().trim()));
            }
            if (pattern.is_some() || marks.is_some()) && source.is_empty() {
                source = "Web search results".to_string();
            }
        }
        Ok(_) => {}
        Err(err) => warn!("Error in web search for syllabus: {}", err),
    }

    if content.is_empty() {
        return ToolOutcome::Empty;
    }
    ToolOutcome::Text(format!(
        "## {}{} Syllabus Information\n\n{}\n\nSource: {}",
        exam,
        subject_suffix(subject),
        content.join("\n\n"),
        source
    ))
}

fn exam_format(article: &Article) -> Option<String> {
    let lower = article.content.to_lowercase();
    if !(lower.contains("question") && lower.contains("format")) {
        return None;
    }
    article
        .content
        .split("\n== ")
        .find(|section| {
            let section = section.to_lowercase();
            section.contains("question") || section.contains("format") || section.contains("pattern")
        })
        .map(excerpt)
}

fn generic_guidance(exam: &str, subject: &str) -> Option<String> {
    match exam.to_lowercase().as_str() {
        "upsc" => Some(format!("UPSC questions in {} typically test conceptual understanding and application of knowledge.", subject)),
        "jee" => Some(format!("JEE questions in {} typically require strong problem-solving skills and analytical thinking.", subject)),
        "neet" => Some(format!("NEET questions in {} focus on testing understanding of fundamental concepts in life sciences.", subject)),
        _ => None,
    }
}

/// Context that helps the model write an exam-style question: format, subject outline, difficulty.
pub async fn exam_question_generator(
    encyclopedia: &dyn Encyclopedia,
    exam: &str,
    subject: &str,
    difficulty: Difficulty,
) -> ToolOutcome {
    info!(
        "exam_question_generator called with exam_type: {}, subject: {}, difficulty: {}",
        exam,
        subject,
        difficulty.label()
    );
    let mut sections: Vec<String> = Vec::new();

    match encyclopedia
        .search(&format!("{} {}", exam, subject), "en", 3)
        .await
    {
        Ok(titles) if !titles.is_empty() => {
            let exam_lower = exam.to_lowercase();
            if let Some(title) = titles.iter().find(|t| t.to_lowercase().contains(&exam_lower)) {
                match encyclopedia.page(title, "en").await {
                    Ok(article) => {
                        if let Some(format_info) = exam_format(&article) {
                            sections.push(format!("Exam format information:\n{}", format_info));
                        }
                    }
                    Err(err) => warn!("Error loading exam article: {}", err),
                }
            }

            let subject_titles = encyclopedia
                .search(&format!("{} {}", subject, exam), "en", 3)
                .await
                .unwrap_or_default();
            if let Some(title) = subject_titles.first() {
                match encyclopedia.page(title, "en").await {
                    Ok(article) => {
                        sections.push(format!("Subject information:\n{}", excerpt(&article.summary)));
                        let topics = headings(&SECTION_HEADINGS, &article.content)
                            .into_iter()
                            .take(MAX_TOPICS)
                            .collect::<Vec<_>>();
                        if !topics.is_empty() {
                            sections.push(format!(
                                "Key topics in {}:\n- {}",
                                subject,
                                topics.join("\n- ")
                            ));
                        }
                    }
                    Err(err) => warn!("Error loading subject article: {}", err),
                }
            }
        }
        Ok(_) => {}
        Err(err) => warn!("Error in Wikipedia information extraction: {}", err),
    }

    if sections.is_empty() {
        sections.extend(generic_guidance(exam, subject));
    }
    sections.push(difficulty.guidance(subject));

    ToolOutcome::Text(format!(
        "Context for generating a {}-level {} question for {}:\n\n{}",
        difficulty.label(),
        subject,
        exam,
        sections.join("\n\n")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{article, FakeEncyclopedia, FakeWebSearch};

    fn upsc_article() -> Article {
        article(
            "Civil Services Examination (UPSC) syllabus",
            "The Civil Services Examination is conducted by UPSC.",
            "== Preliminary ==\nTwo papers.\n\n== History ==\nIndian history.\n=== Ancient India ===\nIndus valley.\n=== Modern India ===\nFreedom struggle.\n\n== Question format ==\nObjective questions with negative marking.",
        )
    }

    #[test]
    fn subject_section_yields_subsection_topics() {
        let outline = subject_outline(&upsc_article().content, "UPSC", "History");
        assert_eq!(
            outline,
            vec![
                "Key topics in History for UPSC:".to_string(),
                "- Ancient India\n- Modern India".to_string()
            ]
        );
    }

    #[test]
    fn without_subject_lists_main_sections() {
        let content = syllabus_from_article(&upsc_article(), "UPSC", None);
        assert_eq!(content[0], "Main sections of UPSC syllabus:");
        assert_eq!(content[1], "- Preliminary\n- History\n- Question format");
    }

    #[tokio::test]
    async fn syllabus_merges_wikipedia_and_exam_pattern() {
        let encyclopedia = FakeEncyclopedia::default().with_article(upsc_article());
        let web = FakeWebSearch::returning(
            "The UPSC exam pattern has three stages: prelims, mains and interview. \
             Marks distribution is 1750 for mains and 275 for the personality test. \
             Candidates should read the official notification every year.",
        );
        let outcome = check_exam_syllabus(&encyclopedia, &web, "UPSC", Some("History")).await;
        let text = outcome.text().unwrap();
        assert!(text.starts_with("## UPSC - History Syllabus Information\n\nKey topics in History for UPSC:"));
        assert!(text.contains("Exam pattern: has three stages: prelims, mains and interview."));
        assert!(text.contains("Marks distribution: is 1750 for mains"));
        assert!(text.ends_with("Source: Wikipedia: https://en.wikipedia.org/wiki/Civil_Services_Examination_(UPSC)_syllabus"));
        assert_eq!(web.queries(), vec!["UPSC official syllabus History official"]);
    }

    #[tokio::test]
    async fn unreachable_sources_give_fallback() {
        let outcome = check_exam_syllabus(
            &FakeEncyclopedia::offline(),
            &FakeWebSearch::offline(),
            "GATE",
            Some("Civil"),
        )
        .await;
        assert!(matches!(outcome, ToolOutcome::Empty));
        assert_eq!(
            syllabus_unavailable_message("GATE", Some("Civil")),
            "Specific syllabus information for GATE (Civil) couldn't be retrieved. The LLM can proceed with its knowledge of this examination."
        );
    }

    #[tokio::test]
    async fn question_context_falls_back_to_generic_guidance() {
        let outcome =
            exam_question_generator(&FakeEncyclopedia::offline(), "JEE", "Physics", Difficulty::Hard)
                .await;
        assert_eq!(
            outcome.text().unwrap(),
            "Context for generating a hard-level Physics question for JEE:\n\n\
             JEE questions in Physics typically require strong problem-solving skills and analytical thinking.\n\n\
             For a difficult Physics question, combine multiple concepts, require deeper analysis, or use uncommon scenarios."
        );
    }

    #[tokio::test]
    async fn question_context_uses_exam_format_and_topics() {
        let encyclopedia = FakeEncyclopedia::default().with_article(upsc_article());
        let outcome =
            exam_question_generator(&encyclopedia, "UPSC", "History", Difficulty::Easy).await;
        let text = outcome.text().unwrap();
        assert!(text.contains("Exam format information:\n"));
        assert!(text.contains("Subject information:\nThe Civil Services Examination is conducted by UPSC...."));
        assert!(text.contains("Key topics in History:\n- Preliminary\n- History\n- Question format"));
        assert!(text.ends_with("focus on basic definitions, straightforward applications, or simple calculations."));
    }
}
