//! Web search over the DuckDuckGo HTML endpoint and plain-text page fetching.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::tools::{ToolError, WebSearch};

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const MAX_RESULTS: usize = 10;
const TEXT_WIDTH: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

pub struct DuckDuckGoSearch {
    http: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<String, ToolError> {
        debug!("Web search: {}", query);
        let html = self
            .http
            .get(SEARCH_ENDPOINT)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let results = parse_results(&html)?;
        if results.is_empty() {
            return Err(ToolError::NotFound(query.to_string()));
        }
        Ok(render_results(&results))
    }
}

fn selector(css: &str) -> Result<Selector, ToolError> {
    Selector::parse(css).map_err(|e| ToolError::Parse(format!("{:?}", e)))
}

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result links point at a redirect with the real target in the `uddg` parameter.
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

pub fn parse_results(html: &str) -> Result<Vec<SearchResult>, ToolError> {
    let document = Html::parse_document(html);
    let result_selector = selector(".result")?;
    let link_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let results = document
        .select(&result_selector)
        .filter_map(|result| {
            let link = result.select(&link_selector).next()?;
            let url = resolve_link(link.value().attr("href")?);
            let snippet = result
                .select(&snippet_selector)
                .next()
                .map(element_text)
                .unwrap_or_default();
            Some(SearchResult {
                title: element_text(link),
                url,
                snippet,
            })
        })
        .take(MAX_RESULTS)
        .collect();
    Ok(results)
}

pub fn render_results(results: &[SearchResult]) -> String {
    let entries = results
        .iter()
        .map(|r| format!("[{}]({})\n{}", r.title, r.url, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("## Search Results\n\n{}", entries)
}

pub fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Page content as readable text, or `"Error: …"` when it cannot be fetched.
pub async fn visit_webpage(http: &reqwest::Client, url: &str) -> String {
    info!("visit_webpage called with url: {}", url);
    let fetched = async {
        let response = http.get(url).send().await?.error_for_status()?;
        Ok::<_, ToolError>(response.text().await?)
    }
    .await;

    match fetched {
        Ok(html) => {
            info!("Successfully fetched webpage content from {}", url);
            html_to_text(&html)
        }
        Err(err) => {
            warn!("Error in visit_webpage: {}", err);
            format!("Error: {}", err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="result results_links">
            <h2 class="result__title">
              <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fpeps.python.org%2Fpep-0008%2F&amp;rut=abc">PEP 8 – Style Guide</a>
            </h2>
            <a class="result__snippet">Coding   conventions for the Python code.</a>
          </div>
          <div class="result">
            <a class="result__a" href="https://example.org/direct">Direct link</a>
          </div>
          <div class="result"><span>no link here</span></div>
        </body></html>"#;

    #[test]
    fn parses_and_unwraps_result_links() {
        let results = parse_results(RESULTS_PAGE).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://peps.python.org/pep-0008/");
        assert_eq!(results[0].title, "PEP 8 – Style Guide");
        assert_eq!(results[0].snippet, "Coding conventions for the Python code.");
        assert_eq!(results[1].url, "https://example.org/direct");
        assert!(results[1].snippet.is_empty());
    }

    #[test]
    fn renders_markdown_links() {
        let rendered = render_results(&parse_results(RESULTS_PAGE).unwrap());
        assert!(rendered.starts_with("## Search Results\n\n[PEP 8 – Style Guide](https://peps.python.org/pep-0008/)"));
    }

    #[test]
    fn converts_markup_to_text() {
        let text = html_to_text("<html><body><h1>Chandrayaan-3</h1><p>Lunar mission.</p></body></html>");
        assert!(text.contains("Chandrayaan-3"));
        assert!(text.contains("Lunar mission."));
        assert!(!text.contains("<p>"));
    }

    #[tokio::test]
    async fn unreachable_page_becomes_error_string() {
        let http = reqwest::Client::new();
        let text = visit_webpage(&http, "not a url").await;
        assert!(text.starts_with("Error: "));
    }
}
