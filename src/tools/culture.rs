use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::tools::{
    split_sentences, truncate_chars, Article, Encyclopedia, ToolError, ToolOutcome, WebSearch,
};

static YEARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{3,4}(?:s\b|\b)").expect("year pattern is valid"));
static ENTITIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*").expect("entity pattern is valid")
});

const COMMON_WORDS: [&str; 12] = [
    "India", "Indian", "Hindu", "Muslim", "Sikh", "Buddhist", "Jain", "The", "These", "Those",
    "This", "That",
];
const MAX_LISTED: usize = 5;
const WEB_EXCERPT_CHARS: usize = 1000;

pub fn no_information_message(concept: &str) -> String {
    format!(
        "No definitive factual sources found for '{}'. The LLM can rely on its knowledge of Indian cultural concepts.",
        concept
    )
}

fn article_facts(article: &Article, region: Option<&str>) -> Vec<String> {
    let mut facts = Vec::new();

    let years = YEARS
        .find_iter(&article.summary)
        .map(|m| m.as_str())
        .take(MAX_LISTED)
        .collect::<Vec<_>>();
    if !years.is_empty() {
        facts.push(format!("Historical timeframe: {}", years.join(", ")));
    }

    let mut entities: Vec<&str> = Vec::new();
    for entity in ENTITIES.find_iter(&article.summary).map(|m| m.as_str()) {
        if !COMMON_WORDS.contains(&entity) && !entities.contains(&entity) {
            entities.push(entity);
        }
    }
    if entities.len() > 1 {
        entities.truncate(MAX_LISTED);
        facts.push(format!("Key associated entities: {}", entities.join(", ")));
    }

    let paragraphs = article
        .summary
        .split('\n')
        .filter(|p| !p.trim().is_empty())
        .take(2)
        .collect::<Vec<_>>();
    if !paragraphs.is_empty() {
        facts.push(paragraphs.join("\n"));
    }

    if let Some(region) = region {
        let needle = region.to_lowercase();
        let regional = article
            .content
            .split("\n\n")
            .find(|paragraph| paragraph.to_lowercase().contains(&needle));
        if let Some(paragraph) = regional {
            info!("Extracted regional context for {}", region);
            facts.push(format!("Regional context for {}: {}", region, paragraph.trim()));
        }
    }

    facts
}

/// Verified facts about an Indian cultural concept, with sources, to enrich a prompt.
pub async fn explain_cultural_concept(
    encyclopedia: &dyn Encyclopedia,
    web: &dyn WebSearch,
    concept: &str,
    region: Option<&str>,
) -> ToolOutcome {
    info!(
        "explain_cultural_concept called for concept: {}, region: {:?}",
        concept, region
    );
    let search_query = format!("{} {} culture tradition", concept, region.unwrap_or("India"));
    let mut facts: Vec<String> = Vec::new();
    let mut sources: Vec<String> = Vec::new();

    match encyclopedia.search(&search_query, "en", 3).await {
        Ok(titles) => {
            debug!("Wikipedia search results for cultural concept: {:?}", titles);
            if let Some(title) = titles.first() {
                match encyclopedia.page(title, "en").await {
                    Ok(article) => {
                        facts.extend(article_facts(&article, region));
                        sources.push(format!("Wikipedia: {}", article.url));
                    }
                    Err(ToolError::Disambiguation { options, .. }) => {
                        facts.push(format!(
                            "The term '{}' has multiple meanings in Indian culture: {}",
                            concept,
                            options
                                .iter()
                                .take(MAX_LISTED)
                                .map(String::as_str)
                                .collect::<Vec<_>>()
                                .join(", ")
                        ));
                    }
                    Err(err) => warn!("Error loading cultural article: {}", err),
                }
            }
        }
        Err(err) => warn!("Error searching Wikipedia for cultural concept: {}", err),
    }

    match web.search(&search_query).await {
        Ok(results) if results.chars().count() > 100 => {
            sources.push("Web search".to_string());
            let needle = concept.to_lowercase();
            let sentences = split_sentences(truncate_chars(&results, WEB_EXCERPT_CHARS))
                .filter(|sentence| sentence.to_lowercase().contains(&needle))
                .take(3)
                .collect::<Vec<_>>();
            if !sentences.is_empty() {
                debug!("Relevant sentences from web search: {:?}", sentences);
                facts.push(format!(
                    "Additional context from search results: {}",
                    sentences.join(" ")
                ));
            }
        }
        Ok(_) => {}
        Err(err) => warn!("Error in web search for cultural concept: {}", err),
    }

    if facts.is_empty() {
        return ToolOutcome::Empty;
    }
    ToolOutcome::Text(format!(
        "## Factual context about {}\n\n{}\n\nSources: {}",
        concept,
        facts.join("\n\n"),
        sources.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{article, FakeEncyclopedia, FakeWebSearch};

    fn diwali() -> Article {
        article(
            "Diwali",
            "Diwali is the Hindu festival of lights.\nIt is celebrated by Sikh and Jain communities since the 1500s and was noted by Al Biruni in 1030.",
            "In Tamil Nadu, Diwali is celebrated with an oil bath before sunrise.",
        )
    }

    #[test]
    fn extracts_years_entities_and_regional_paragraph() {
        let facts = article_facts(&diwali(), Some("Tamil Nadu"));
        assert_eq!(facts[0], "Historical timeframe: 1500s, 1030");
        assert_eq!(facts[1], "Key associated entities: Diwali, It, Al Biruni");
        assert!(facts[2].starts_with("Diwali is the Hindu festival of lights.\nIt is"));
        assert!(facts[3].starts_with("Regional context for Tamil Nadu: In Tamil Nadu"));
    }

    #[tokio::test]
    async fn combines_wikipedia_and_web_sources() {
        let encyclopedia = FakeEncyclopedia::default().with_article(diwali());
        let web = FakeWebSearch::returning(
            "Diwali marks the return of Rama to Ayodhya. Fireworks are common in many cities across the country, and sweets are shared with neighbours. Diwali falls in October or November.",
        );
        let outcome = explain_cultural_concept(&encyclopedia, &web, "Diwali", None).await;
        let text = outcome.text().unwrap();
        assert!(text.starts_with("## Factual context about Diwali\n\n"));
        assert!(text.contains(
            "Additional context from search results: Diwali marks the return of Rama to Ayodhya Diwali falls in October or November"
        ));
        assert!(text.ends_with("Sources: Wikipedia: https://en.wikipedia.org/wiki/Diwali, Web search"));
        assert_eq!(web.queries(), vec!["Diwali India culture tradition"]);
    }

    #[tokio::test]
    async fn ambiguous_term_is_reported_as_multiple_meanings() {
        let encyclopedia = FakeEncyclopedia::default()
            .with_disambiguation("Pongal", &["Pongal (festival)", "Pongal (dish)"]);
        let web = FakeWebSearch::offline();
        let outcome = explain_cultural_concept(&encyclopedia, &web, "Pongal", None).await;
        assert!(outcome.text().unwrap().contains(
            "The term 'Pongal' has multiple meanings in Indian culture: Pongal (festival), Pongal (dish)"
        ));
    }

    #[tokio::test]
    async fn total_failure_is_empty() {
        let outcome = explain_cultural_concept(
            &FakeEncyclopedia::offline(),
            &FakeWebSearch::offline(),
            "Bonalu",
            Some("Telangana"),
        )
        .await;
        assert!(matches!(outcome, ToolOutcome::Empty));
        assert!(outcome
            .or_fallback(|| no_information_message("Bonalu"))
            .starts_with("No definitive factual sources found for 'Bonalu'"));
    }
}
