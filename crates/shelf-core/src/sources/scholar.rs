//! Google Scholar source adapter
//!
//! Scholar has no API; result pages are scraped. Requests go through the
//! configured scraping proxy first and fall back to a direct fetch when the
//! proxy is unset, fails, or returns a page with no parseable results.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Value};
use shelf_domain::{ItemType, LibraryItem};

use super::mapping::{apply_mapping_all, FieldRule, ItemField, SourceMapping, Transform};
use super::traits::{require_query, PaperSearch, SourceError, SourceMetadata};
use crate::http::HttpClient;

const BASE_URL: &str = "https://scholar.google.com";

/// Scholar serves at most 20 results per page
pub const MAX_PAGE_SIZE: u32 = 20;

lazy_static! {
    static ref TYPE_TAGS: Regex = Regex::new(r"^\s*(\[[A-Z]+\]\s*)+").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

const FIELDS: &[FieldRule] = &[
    FieldRule::new(ItemField::Title, &["title"], Transform::Text),
    FieldRule::new(ItemField::Author, &["authors"], Transform::Text),
    FieldRule::new(ItemField::Summary, &["snippet"], Transform::Text),
    FieldRule::new(ItemField::CitationCount, &["citedBy"], Transform::CountOrZero),
    FieldRule::new(ItemField::PublishingYear, &["byline"], Transform::FirstYearRun),
    FieldRule::new(ItemField::Url, &["link"], Transform::Text),
];

/// Field mapping for a scraped Scholar record
pub const SCHOLAR_MAPPING: SourceMapping = SourceMapping {
    source_id: "scholar",
    item_type: Some(ItemType::Paper),
    rules: FIELDS,
};

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(e.to_string()))
}

fn clean_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

pub struct ScholarSource {
    http: HttpClient,
    base_url: String,
    /// Scraping proxy URL template; `{url}` is replaced by the encoded target
    proxy_url: Option<String>,
}

impl ScholarSource {
    pub fn new(http: HttpClient, proxy_url: Option<String>) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
            proxy_url,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn source_metadata() -> SourceMetadata {
        SourceMetadata {
            id: "scholar",
            name: "Google Scholar",
            description: "Scholarly literature search (scraped result pages)",
            base_url: BASE_URL,
            requires_api_key: false,
        }
    }

    /// Build the Scholar search URL for a query
    pub fn search_url(&self, query: &str, max_results: u32) -> String {
        format!(
            "{}/scholar?hl=en&q={}&num={}",
            self.base_url,
            urlencoding::encode(query),
            max_results.clamp(1, MAX_PAGE_SIZE)
        )
    }

    /// Wrap a target URL in the proxy template
    pub fn proxied_url(template: &str, target: &str) -> String {
        template.replace("{url}", &urlencoding::encode(target))
    }

    /// Extract raw records from a results page
    pub fn parse_results_page(html: &str) -> Result<Vec<Value>, SourceError> {
        let document = Html::parse_document(html);
        let result_selector = selector("div.gs_ri")?;
        let title_selector = selector("h3.gs_rt")?;
        let link_selector = selector("h3.gs_rt a")?;
        let byline_selector = selector("div.gs_a")?;
        let snippet_selector = selector("div.gs_rs")?;
        let footer_link_selector = selector("div.gs_fl a")?;

        let mut records = Vec::new();

        for result in document.select(&result_selector) {
            let title = result
                .select(&title_selector)
                .next()
                .map(clean_text)
                .map(|t| TYPE_TAGS.replace(&t, "").trim().to_string())
                .unwrap_or_default();

            let link = result
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|s| s.to_string());

            let byline = result
                .select(&byline_selector)
                .next()
                .map(clean_text)
                .unwrap_or_default();

            // "A Author, B Author - Venue, 2017 - publisher.com"
            let authors = byline
                .split(" - ")
                .next()
                .map(|s| s.trim().trim_end_matches('…').trim().to_string())
                .unwrap_or_default();

            let snippet = result.select(&snippet_selector).next().map(clean_text);

            let cited_by = result
                .select(&footer_link_selector)
                .map(clean_text)
                .find(|text| text.starts_with("Cited by"));

            records.push(json!({
                "title": title,
                "authors": authors,
                "byline": byline,
                "snippet": snippet,
                "citedBy": cited_by,
                "link": link,
            }));
        }

        Ok(records)
    }

    /// Parse a results page into items; records without a title are excluded
    pub fn parse_search_page(html: &str) -> Result<Vec<LibraryItem>, SourceError> {
        let records = Self::parse_results_page(html)?;
        Ok(apply_mapping_all(&records, &SCHOLAR_MAPPING))
    }

    async fn fetch_page(&self, url: &str) -> Result<String, SourceError> {
        let response = self.http.get(url).await?;
        if !response.is_success() {
            return Err(SourceError::Status(response.status));
        }
        Ok(response.body)
    }

    async fn fetch_via_proxy(&self, template: &str, target: &str) -> Result<Vec<LibraryItem>, SourceError> {
        let html = self.fetch_page(&Self::proxied_url(template, target)).await?;
        let items = Self::parse_search_page(&html)?;
        if items.is_empty() {
            return Err(SourceError::NotFound);
        }
        Ok(items)
    }
}

#[async_trait]
impl PaperSearch for ScholarSource {
    fn metadata(&self) -> SourceMetadata {
        Self::source_metadata()
    }

    async fn search_papers(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<LibraryItem>, SourceError> {
        let query = require_query(query)?;
        let target = self.search_url(query, max_results);

        if let Some(template) = self.proxy_url.as_deref() {
            match self.fetch_via_proxy(template, &target).await {
                Ok(items) => return Ok(items),
                Err(e) => {
                    tracing::warn!("Scholar proxy fetch failed: {}, falling back to direct fetch", e);
                }
            }
        }

        tracing::debug!(query, "Fetching Scholar results directly");
        let html = self.fetch_page(&target).await?;
        Self::parse_search_page(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r##"
    <html><body>
      <div class="gs_r gs_or gs_scl">
        <div class="gs_ri">
          <h3 class="gs_rt"><span class="gs_ctc">[PDF]</span> <a href="https://arxiv.org/abs/1706.03762">Attention is all you need</a></h3>
          <div class="gs_a">A Vaswani, N Shazeer, N Parmar - Advances in neural information processing systems, 2017 - proceedings.neurips.cc</div>
          <div class="gs_rs">The dominant sequence transduction models are based on complex recurrent networks</div>
          <div class="gs_fl"><a href="#">Save</a><a href="/scholar?cites=1">Cited by 120,345</a></div>
        </div>
      </div>
      <div class="gs_r gs_or gs_scl">
        <div class="gs_ri">
          <h3 class="gs_rt"></h3>
          <div class="gs_a">Nobody - 1999</div>
        </div>
      </div>
      <div class="gs_r gs_or gs_scl">
        <div class="gs_ri">
          <h3 class="gs_rt">[CITATION] [C] Deep learning</h3>
          <div class="gs_a">Y LeCun, Y Bengio, G Hinton - nature</div>
        </div>
      </div>
    </body></html>"##;

    #[test]
    fn test_parse_search_page() {
        let items = ScholarSource::parse_search_page(SAMPLE_PAGE).unwrap();
        assert_eq!(items.len(), 2);

        let attention = &items[0];
        assert_eq!(attention.title, "Attention is all you need");
        assert_eq!(
            attention.author.as_deref(),
            Some("A Vaswani, N Shazeer, N Parmar")
        );
        assert_eq!(attention.publishing_year, Some(2017));
        assert_eq!(attention.citation_count, Some(120345));
        assert_eq!(
            attention.url.as_deref(),
            Some("https://arxiv.org/abs/1706.03762")
        );
        assert_eq!(attention.item_type, Some(ItemType::Paper));
    }

    #[test]
    fn test_missing_cited_by_defaults_to_zero() {
        let items = ScholarSource::parse_search_page(SAMPLE_PAGE).unwrap();
        let deep = &items[1];
        assert_eq!(deep.title, "Deep learning");
        assert_eq!(deep.citation_count, Some(0));
        assert_eq!(deep.publishing_year, None);
    }

    #[test]
    fn test_selector_mismatch_yields_nothing() {
        let items = ScholarSource::parse_search_page("<html><p>captcha</p></html>").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_proxied_url() {
        let url = ScholarSource::proxied_url(
            "https://proxy.example/?key=k&url={url}",
            "https://scholar.google.com/scholar?q=a b",
        );
        assert!(url.starts_with("https://proxy.example/?key=k&url=https%3A%2F%2F"));
    }

    #[test]
    fn test_search_url_clamps_page_size() {
        let source = ScholarSource::new(HttpClient::default(), None);
        let url = source.search_url("graph neural networks", 100);
        assert!(url.contains("q=graph%20neural%20networks"));
        assert!(url.ends_with("num=20"));
    }
}
