mod page_parser;
mod page_source;
mod scrape_writer;
mod scraper_types;

pub use page_parser::{normalize_text, ExtractedLinks, PageParser};
pub use page_source::{HttpSource, PageSource};
pub use scrape_writer::{format_article, provision_folders, write_article};
pub use scraper_types::*;

use grimoire::{Config, FailurePolicy, OutputLayout};
use std::{collections::HashSet, path::PathBuf};

/// Harvests every configured category of the wiki into text files, one category after another
/// and one article after another
pub struct Scraper<S: PageSource> {
    config: Config,
    source: S,
    parser: PageParser,
    layout: OutputLayout,
}

impl Scraper<HttpSource> {
    /// Creates a scraper which reads from the live wiki
    pub fn new(config: Config) -> Result<Scraper<HttpSource>, ScrapeError> {
        let source = HttpSource::new(&config.request)?;
        Scraper::with_source(config, source)
    }
}

impl<S: PageSource> Scraper<S> {
    pub fn with_source(config: Config, source: S) -> Result<Scraper<S>, ScrapeError> {
        config.validate()?;
        let parser = PageParser::new(&config)?;
        let layout = OutputLayout::from_config(&config);

        Ok(Scraper {
            config,
            source,
            parser,
            layout,
        })
    }

    /// The source pages are read from
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs the whole harvest. Failures are handled according to the failure policy; only
    /// `abort-run` (and failing to create the folders) makes this return an error.
    pub fn scrape(&self) -> Result<HarvestReport, ScrapeError> {
        tracing::info!(
            categories = self.config.categories.len(),
            output = %self.layout.output_dir().display(),
            "creating category folders"
        );
        provision_folders(&self.layout, &self.config.categories)?;

        let mut report = HarvestReport::default();
        for category in self.config.categories.iter() {
            report.categories.push(self.scrape_category(category)?);
        }

        Ok(report)
    }

    /// Finds the articles of every category without fetching or saving them
    pub fn dry_scrape(&self) -> Result<Vec<DiscoveredCategory>, ScrapeError> {
        let mut discovered = Vec::with_capacity(self.config.categories.len());

        for category in self.config.categories.iter() {
            let (urls, error) = match self.discover(category) {
                Ok(urls) => (urls, None),
                Err(e) if self.config.failure_policy == FailurePolicy::AbortRun => return Err(e),
                Err(e) => {
                    tracing::warn!(%category, error = %e, "could not read category page");
                    (Vec::new(), Some(e.to_string()))
                }
            };

            for url in urls.iter() {
                tracing::info!(%category, %url, "found article");
            }

            discovered.push(DiscoveredCategory {
                category: category.clone(),
                urls,
                error,
            });
        }

        Ok(discovered)
    }

    fn scrape_category(&self, category: &str) -> Result<CategoryReport, ScrapeError> {
        let mut report = CategoryReport::new(category);
        let policy = self.config.failure_policy;

        tracing::info!(%category, "processing category");
        let urls = match self.discover(category) {
            Ok(urls) => urls,
            Err(e) if policy == FailurePolicy::AbortRun => return Err(e),
            Err(e) => {
                tracing::error!(%category, error = %e, "giving up on category");
                report.aborted = Some(e.to_string());
                return Ok(report);
            }
        };

        report.discovered = urls.len();
        tracing::info!(%category, articles = urls.len(), "found articles");

        for (index, url) in urls.iter().enumerate() {
            tracing::info!(
                %category,
                "processing article {}/{}: {}",
                index + 1,
                urls.len(),
                url
            );

            match self.scrape_article(category, url) {
                Ok(path) => {
                    report.saved += 1;
                    tracing::info!(path = %path.display(), "saved");
                }
                Err(e) => match policy {
                    FailurePolicy::Skip => {
                        tracing::warn!(%category, %url, error = %e, "skipping article");
                        report.skipped.push(SkippedArticle {
                            url: url.clone(),
                            reason: e.to_string(),
                        });
                    }
                    FailurePolicy::AbortCategory => {
                        tracing::error!(
                            %category,
                            %url,
                            error = %e,
                            remaining = urls.len() - index,
                            "giving up on category"
                        );
                        report.aborted = Some(e.to_string());
                        break;
                    }
                    FailurePolicy::AbortRun => return Err(e),
                },
            }
        }

        Ok(report)
    }

    // Gets the article urls listed on a category page, after deduplication and the limit
    fn discover(&self, category: &str) -> Result<Vec<String>, ScrapeError> {
        let url = self.config.category_url(category);
        let page = self.source.fetch(&url)?;

        let ExtractedLinks {
            mut urls,
            missing_href,
        } = self.parser.extract_links(&page);

        if missing_href > 0 {
            tracing::warn!(%category, anchors = missing_href, "ignored article links without an href");
        }

        if self.config.dedupe_links {
            let mut seen = HashSet::new();
            urls.retain(|url| seen.insert(url.clone()));
        }

        if let Some(limit) = self.config.article_limit {
            urls.truncate(limit);
        }

        Ok(urls)
    }

    fn scrape_article(&self, category: &str, url: &str) -> Result<PathBuf, ScrapeError> {
        let page = self.source.fetch(url)?;
        let article = self
            .parser
            .parse_article(url, &page)
            .map_err(|source| ScrapeError::Parse {
                url: String::from(url),
                source,
            })?;

        write_article(&self.layout, category, &article)
    }
}
