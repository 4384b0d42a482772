//! CNN edition article scraper.
//!
//! The index page (by default the markets section of
//! [CNN](https://edition.cnn.com/markets)) links articles with relative URLs
//! such as `/2023/01/05/investing/stocks-week-ahead/index.html`. The date in
//! the path makes a plain substring match on the year a cheap recency filter.
//!
//! Article pages keep their body in a single `.article__content-container`
//! region; the page `<title>` carries a ` | CNN Business` style suffix that
//! [`clean_title`] cuts off.

use crate::config::Config;
use crate::error::{DigestError, Result};
use crate::models::{Article, LinkEntry};
use crate::scrapers::{filter_links, PageFetch};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static selector is valid"));
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector is valid"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex is valid"));

/// Index and article parsing for one configured site.
#[derive(Debug, Clone)]
pub struct CnnSite {
    index_url: String,
    base_url: Url,
    link_filter: String,
    content_selector: Selector,
    content_selector_src: String,
    title_marker: String,
}

impl CnnSite {
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.site_base_url)?;
        let content_selector = Selector::parse(&config.content_selector).map_err(|e| {
            DigestError::Config(format!(
                "invalid content selector `{}`: {e}",
                config.content_selector
            ))
        })?;

        Ok(Self {
            index_url: config.index_url.clone(),
            base_url,
            link_filter: config.link_filter(),
            content_selector,
            content_selector_src: config.content_selector.clone(),
            title_marker: config.title_marker.clone(),
        })
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Filter the raw hrefs of an index page and resolve the survivors.
    ///
    /// Filtering looks at the href exactly as written in the page, before
    /// resolution, so the site's own host name never matches the token.
    pub fn index_links(&self, html: &str) -> Vec<LinkEntry> {
        let hrefs = extract_hrefs(html);
        let kept = filter_links(&hrefs, &self.link_filter);
        debug!(
            total = hrefs.len(),
            kept = kept.len(),
            filter = %self.link_filter,
            "Filtered index links"
        );

        kept.into_iter()
            .filter_map(|href| match self.base_url.join(&href) {
                Ok(resolved) => Some(resolved.to_string()),
                Err(e) => {
                    warn!(%href, error = %e, "Skipping unresolvable link");
                    None
                }
            })
            .collect()
    }

    /// Fetch the index page and return the filtered, resolved article links.
    #[instrument(level = "info", skip_all, fields(index_url = %self.index_url))]
    pub async fn index_articles<F: PageFetch>(&self, fetcher: &F) -> Result<Vec<LinkEntry>> {
        let html = fetcher.fetch_page(&self.index_url).await?;
        let links = self.index_links(&html);
        info!(count = links.len(), "Indexed article URLs");
        Ok(links)
    }

    /// Extract title and body text from an article page.
    ///
    /// A page without `<title>` yields an empty title. A page without the
    /// content region is an error: there is nothing to summarize.
    pub fn parse_article(&self, url: &str, html: &str) -> Result<Article> {
        let document = Html::parse_document(html);

        let title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let content = document
            .select(&self.content_selector)
            .next()
            .map(element_text)
            .ok_or_else(|| DigestError::SelectorNotFound {
                selector: self.content_selector_src.clone(),
                url: url.to_string(),
            })?;

        Ok(Article {
            source: url.to_string(),
            title,
            content,
        })
    }

    /// Fetch and parse a single article.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch_article<F: PageFetch>(&self, fetcher: &F, url: &str) -> Result<Article> {
        let html = fetcher.fetch_page(url).await?;
        let article = self.parse_article(url, &html)?;
        info!(bytes = article.content.len(), "Parsed article");
        Ok(article)
    }

    pub fn clean_title(&self, title: &str) -> String {
        clean_title(title, &self.title_marker)
    }
}

/// Raw `href` values of every anchor in the page, in document order.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Cut everything from the first `marker` onward. Nothing is trimmed.
///
/// ```ignore
/// assert_eq!(clean_title("Markets news today | CNN Business", "|"), "Markets news today ");
/// ```
pub fn clean_title(title: &str, marker: &str) -> String {
    if marker.is_empty() {
        return title.to_string();
    }
    match title.find(marker) {
        Some(end) => title[..end].to_string(),
        None => title.to_string(),
    }
}

/// Text of an element with runs of whitespace collapsed to one space.
fn element_text(element: ElementRef<'_>) -> String {
    let text = element.text().join(" ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_HTML: &str = r##"
        <html><head><title>Markets | CNN Business</title></head>
        <body>
          <a href="/2023/01/05/investing/stocks-week-ahead/index.html">Stocks</a>
          <a href="/markets/fear-and-greed">Fear &amp; Greed</a>
          <a href="/2022/12/30/economy/recap/index.html">Recap</a>
          <a href="https://edition.cnn.com/2023/01/06/business/jobs/index.html">Jobs</a>
          <a name="anchor-without-href">x</a>
        </body></html>
    "##;

    const ARTICLE_HTML: &str = r#"
        <html><head><title>Stocks end the week higher | CNN Business</title></head>
        <body>
          <h1>Stocks end the week higher</h1>
          <div class="article__content-container">
            <p>Wall Street closed   higher on Friday.</p>
            <p>Investors cheered
               the jobs report.</p>
          </div>
        </body></html>
    "#;

    fn site(filter: &str) -> CnnSite {
        let config = Config {
            link_filter: Some(filter.to_string()),
            ..Config::default()
        };
        CnnSite::from_config(&config).unwrap()
    }

    #[test]
    fn test_extract_hrefs_in_document_order() {
        let hrefs = extract_hrefs(INDEX_HTML);
        assert_eq!(hrefs.len(), 4);
        assert_eq!(hrefs[0], "/2023/01/05/investing/stocks-week-ahead/index.html");
        assert_eq!(hrefs[1], "/markets/fear-and-greed");
    }

    #[test]
    fn test_index_links_filters_then_resolves() {
        let links = site("2023").index_links(INDEX_HTML);
        assert_eq!(
            links,
            vec![
                "https://edition.cnn.com/2023/01/05/investing/stocks-week-ahead/index.html",
                "https://edition.cnn.com/2023/01/06/business/jobs/index.html",
            ]
        );
    }

    #[test]
    fn test_parse_article() {
        let article = site("2023")
            .parse_article("https://edition.cnn.com/a", ARTICLE_HTML)
            .unwrap();
        assert_eq!(article.title, "Stocks end the week higher | CNN Business");
        assert_eq!(
            article.content,
            "Wall Street closed higher on Friday. Investors cheered the jobs report."
        );
        assert_eq!(article.source, "https://edition.cnn.com/a");
    }

    #[test]
    fn test_parse_article_without_title() {
        let html = r#"<div class="article__content-container">Body</div>"#;
        let article = site("2023").parse_article("https://x/a", html).unwrap();
        assert_eq!(article.title, "");
        assert_eq!(article.content, "Body");
    }

    #[test]
    fn test_missing_content_region_is_selector_not_found() {
        let html =
            "<html><head><title>Video | CNN</title></head><body><video></video></body></html>";
        let err = site("2023").parse_article("https://x/v", html).unwrap_err();
        match err {
            DigestError::SelectorNotFound { selector, url } => {
                assert_eq!(selector, ".article__content-container");
                assert_eq!(url, "https://x/v");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_content_selector_is_config_error() {
        let config = Config {
            content_selector: "div[".to_string(),
            ..Config::default()
        };
        assert!(matches!(CnnSite::from_config(&config), Err(DigestError::Config(_))));
    }

    #[test]
    fn test_clean_title_truncation_boundary() {
        assert_eq!(
            clean_title("Markets news today | CNN Business", "|"),
            "Markets news today "
        );
    }

    #[test]
    fn test_clean_title_without_marker() {
        assert_eq!(clean_title("Plain title", "|"), "Plain title");
        assert_eq!(clean_title("a | b | c", "|"), "a ");
        assert_eq!(clean_title("Keep | all", ""), "Keep | all");
        assert_eq!(clean_title("| leading", "|"), "");
    }
}
