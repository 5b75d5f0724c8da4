use super::{Article, ParseError, ScrapeError};
use grimoire::{config::resolve_link, Config};
use scraper::{ElementRef, Html, Selector};

/// Article links found on a category page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLinks {
    /// Absolute article urls in document order, duplicates included
    pub urls: Vec<String>,
    /// Marked anchors that had no href
    pub missing_href: usize,
}

/// Finds the interesting parts of wiki pages, using the marker classes from the config
pub struct PageParser {
    base_url: String,
    link: Selector,
    title: Selector,
    title_css: String,
    content: Selector,
}

impl PageParser {
    pub fn new(config: &Config) -> Result<PageParser, ScrapeError> {
        let markers = &config.markers;
        let title_css = format!("h1.{}", markers.title_class);

        Ok(PageParser {
            base_url: config.base_url.clone(),
            link: parse_selector(&format!("a.{}", markers.link_class))?,
            title: parse_selector(&title_css)?,
            title_css,
            content: parse_selector(&format!("div.{}", markers.content_class))?,
        })
    }

    /// Collects the target of every marked anchor on a category page
    pub fn extract_links(&self, page: &str) -> ExtractedLinks {
        let document = Html::parse_document(page);
        let mut urls = Vec::new();
        let mut missing_href = 0;

        for anchor in document.select(&self.link) {
            match anchor.value().attr("href") {
                Some(href) => urls.push(resolve_link(&self.base_url, href)),
                None => missing_href += 1,
            }
        }

        ExtractedLinks { urls, missing_href }
    }

    /// Reads the title and body out of an article page. The page must have a title, but a
    /// missing body just leaves the article empty.
    pub fn parse_article(&self, url: &str, page: &str) -> Result<Article, ParseError> {
        let document = Html::parse_document(page);

        let title = document
            .select(&self.title)
            .next()
            .map(|heading| heading.text().collect::<String>())
            .map(|text| String::from(text.trim()))
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ParseError::MissingTitle {
                selector: self.title_css.clone(),
            })?;

        let body = document
            .select(&self.content)
            .next()
            .map(normalize_text)
            .unwrap_or_default();

        Ok(Article {
            url: String::from(url),
            title,
            body,
        })
    }
}

/// Flattens the text inside an element. Every text run is trimmed, empty runs are dropped and
/// the rest are put on their own lines.
pub fn normalize_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector {
        selector: String::from(css),
        reason: e.to_string(),
    })
}
