use grimoire::ConfigError;
use http::StatusCode;
use std::{io, path::PathBuf};
use thiserror::Error;

/// One wiki page, as read from the wiki. Only lives until it has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// The absolute url the page was fetched from
    pub url: String,
    /// The name of the article, user-facing
    pub title: String,
    /// The text of the article body, one text run per line
    pub body: String,
}

/// Problems with the markup of a page
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no title matching '{selector}' on the page")]
    MissingTitle { selector: String },
}

/// Holds information about the errors which can happen while harvesting
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request to {url} failed: {source}")]
    Web {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },

    #[error("could not parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: ParseError,
    },

    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("could not create the http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// An article which could not be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedArticle {
    pub url: String,
    pub reason: String,
}

/// What happened to one category during a harvest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: String,
    /// Number of article links that were going to be processed
    pub discovered: usize,
    pub saved: usize,
    pub skipped: Vec<SkippedArticle>,
    /// Set when the category was given up on, holding the reason
    pub aborted: Option<String>,
}

impl CategoryReport {
    pub fn new(category: &str) -> Self {
        CategoryReport {
            category: String::from(category),
            discovered: 0,
            saved: 0,
            skipped: Vec::new(),
            aborted: None,
        }
    }

    /// True if every discovered article was saved
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && self.skipped.is_empty() && self.saved == self.discovered
    }
}

/// Summary of a whole harvest, one entry per category in the order they were processed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub categories: Vec<CategoryReport>,
}

impl HarvestReport {
    pub fn saved(&self) -> usize {
        self.categories.iter().map(|c| c.saved).sum()
    }

    pub fn skipped(&self) -> usize {
        self.categories.iter().map(|c| c.skipped.len()).sum()
    }

    pub fn aborted(&self) -> impl Iterator<Item = &CategoryReport> {
        self.categories.iter().filter(|c| c.aborted.is_some())
    }

    pub fn is_complete(&self) -> bool {
        self.categories.iter().all(CategoryReport::is_complete)
    }

    pub fn category(&self, name: &str) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == name)
    }
}

/// The article links found on one category page, without fetching any of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCategory {
    pub category: String,
    pub urls: Vec<String>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_totals() {
        let mut spells = CategoryReport::new("spells");
        spells.discovered = 3;
        spells.saved = 2;
        spells.skipped.push(SkippedArticle {
            url: String::from("https://wiki.test/spell:broken"),
            reason: String::from("no title"),
        });

        let mut feats = CategoryReport::new("feats");
        feats.discovered = 1;
        feats.saved = 1;

        let report = HarvestReport {
            categories: vec![spells, feats],
        };

        assert_eq!(report.saved(), 3);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.aborted().count(), 0);
        assert!(!report.is_complete());
        assert!(report.category("feats").unwrap().is_complete());
        assert!(report.category("items").is_none());
    }

    #[test]
    fn aborted_category_is_incomplete() {
        let mut items = CategoryReport::new("items");
        items.aborted = Some(String::from("timed out"));
        assert!(!items.is_complete());
    }

    #[test]
    fn empty_report_is_complete() {
        assert!(HarvestReport::default().is_complete());
    }
}
