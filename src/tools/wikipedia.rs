//! MediaWiki API client and the encyclopedia lookup tool built on it.

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::tools::{Article, Encyclopedia, ToolError, ToolOutcome};

const SEARCH_RESULTS: usize = 5;
const DISAMBIGUATION_LINKS: usize = 20;

pub struct WikipediaClient {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    query: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    fullurl: String,
    pageprops: Option<PageProps>,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    disambiguation: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Link {
    title: String,
}

impl WikipediaClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn endpoint(language: &str) -> String {
        let language = if !language.is_empty()
            && language.chars().all(|c| c.is_ascii_lowercase() || c == '-')
        {
            // Romanized variants ("hi-ro") have no wiki of their own.
            language.split('-').next().unwrap_or("en")
        } else {
            "en"
        };
        format!("https://{}.wikipedia.org/w/api.php", language)
    }

    async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        language: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ToolError> {
        let response = self
            .http
            .get(Self::endpoint(language))
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| ToolError::Parse(e.to_string()))?;
        body.query
            .ok_or_else(|| ToolError::Parse("response has no 'query' object".to_string()))
    }

    async fn disambiguation_options(
        &self,
        title: &str,
        language: &str,
    ) -> Result<Vec<String>, ToolError> {
        let limit = DISAMBIGUATION_LINKS.to_string();
        let pages: PagesQuery = self
            .query(
                language,
                &[
                    ("prop", "links"),
                    ("plnamespace", "0"),
                    ("pllimit", limit.as_str()),
                    ("titles", title),
                ],
            )
            .await?;
        Ok(pages
            .pages
            .into_iter()
            .flat_map(|page| page.links)
            .map(|link| link.title)
            .collect())
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    async fn search(
        &self,
        query: &str,
        language: &str,
        limit: usize,
    ) -> Result<Vec<String>, ToolError> {
        let limit = limit.to_string();
        let results: SearchQuery = self
            .query(
                language,
                &[
                    ("list", "search"),
                    ("srsearch", query),
                    ("srlimit", limit.as_str()),
                ],
            )
            .await?;
        Ok(results.search.into_iter().map(|hit| hit.title).collect())
    }

    async fn page(&self, title: &str, language: &str) -> Result<Article, ToolError> {
        let pages: PagesQuery = self
            .query(
                language,
                &[
                    ("prop", "extracts|info|pageprops"),
                    ("explaintext", "1"),
                    ("inprop", "url"),
                    ("redirects", "1"),
                    ("titles", title),
                ],
            )
            .await?;

        let page = pages
            .pages
            .into_iter()
            .next()
            .filter(|page| !page.missing)
            .ok_or_else(|| ToolError::NotFound(title.to_string()))?;

        let is_disambiguation = page
            .pageprops
            .as_ref()
            .map_or(false, |props| props.disambiguation.is_some());
        if is_disambiguation {
            let options = self.disambiguation_options(&page.title, language).await?;
            return Err(ToolError::Disambiguation {
                title: page.title,
                options,
            });
        }

        Ok(Article {
            summary: lead_section(&page.extract).to_string(),
            title: page.title,
            url: page.fullurl,
            content: page.extract,
        })
    }
}

/// Text before the first `== Heading ==` marker.
pub fn lead_section(content: &str) -> &str {
    match content.find("\n== ") {
        Some(idx) => content[..idx].trim(),
        None => content.trim(),
    }
}

pub fn format_article(article: &Article) -> String {
    format!(
        "## {}\n\n{}\n\nSource: {}",
        article.title, article.summary, article.url
    )
}

pub fn not_found_message(query: &str) -> String {
    format!("No Wikipedia articles found for '{}'.", query)
}

/// Looks up the best matching article; a disambiguation page resolves to its first option.
pub async fn search_wikipedia(
    encyclopedia: &dyn Encyclopedia,
    query: &str,
    language: &str,
) -> ToolOutcome {
    info!("search_wikipedia called with query: {}, language: {}", query, language);

    let titles = match encyclopedia.search(query, language, SEARCH_RESULTS).await {
        Ok(titles) => titles,
        Err(err) => {
            warn!("Error searching Wikipedia: {}", err);
            return ToolOutcome::Failed(err);
        }
    };
    debug!("Wikipedia search results: {:?}", titles);

    let Some(first) = titles.first() else {
        return ToolOutcome::Empty;
    };

    match encyclopedia.page(first, language).await {
        Ok(article) => ToolOutcome::Text(format_article(&article)),
        Err(ToolError::Disambiguation { options, .. }) => {
            let Some(option) = options.first() else {
                return ToolOutcome::Empty;
            };
            match encyclopedia.page(option, language).await {
                Ok(article) => {
                    info!("Disambiguation resolved to: {}", article.title);
                    ToolOutcome::Text(format_article(&article))
                }
                Err(err) => {
                    warn!("Error resolving disambiguation: {}", err);
                    ToolOutcome::Text(format!(
                        "Multiple Wikipedia articles found for '{}'. Options include: {}.",
                        query,
                        options
                            .iter()
                            .take(5)
                            .map(String::as_str)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                }
            }
        }
        Err(err) => {
            warn!("Error retrieving Wikipedia page: {}", err);
            ToolOutcome::Failed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{article, FakeEncyclopedia};

    #[test]
    fn lead_section_stops_at_first_heading() {
        let content = "Diwali is a festival.\nIt lasts five days.\n\n\n== History ==\nOld.";
        assert_eq!(lead_section(content), "Diwali is a festival.\nIt lasts five days.");
        assert_eq!(lead_section("  no headings "), "no headings");
    }

    #[test]
    fn endpoint_uses_base_language_of_romanized_codes() {
        assert_eq!(
            WikipediaClient::endpoint("hi-ro"),
            "https://hi.wikipedia.org/w/api.php"
        );
        assert_eq!(
            WikipediaClient::endpoint("../evil"),
            "https://en.wikipedia.org/w/api.php"
        );
    }

    #[tokio::test]
    async fn formats_first_search_hit() {
        let encyclopedia = FakeEncyclopedia::default().with_article(article(
            "Diwali",
            "Diwali is the Hindu festival of lights.",
            "",
        ));
        let outcome = search_wikipedia(&encyclopedia, "diwali", "en").await;
        let text = outcome.text().expect("article text");
        assert!(text.starts_with("## Diwali\n\nDiwali is the Hindu festival of lights."));
        assert!(text.ends_with("Source: https://en.wikipedia.org/wiki/Diwali"));
    }

    #[tokio::test]
    async fn disambiguation_takes_first_option() {
        let encyclopedia = FakeEncyclopedia::default()
            .with_disambiguation("Mercury", &["Mercury (planet)", "Mercury (element)"])
            .with_article(article("Mercury (planet)", "The smallest planet.", ""));
        let outcome = search_wikipedia(&encyclopedia, "Mercury", "en").await;
        assert!(outcome.text().unwrap().starts_with("## Mercury (planet)"));
    }

    #[tokio::test]
    async fn no_hits_and_failures_never_produce_text() {
        let empty = FakeEncyclopedia::default();
        assert!(matches!(
            search_wikipedia(&empty, "zzzz", "en").await,
            ToolOutcome::Empty
        ));

        let offline = FakeEncyclopedia::offline();
        let outcome = search_wikipedia(&offline, "Diwali", "en").await;
        assert!(matches!(outcome, ToolOutcome::Failed(_)));
        assert_eq!(
            outcome.or_fallback(|| not_found_message("Diwali")),
            "No Wikipedia articles found for 'Diwali'."
        );
    }
}
