use clap::Parser;
use grimoire::{is_known_category, Config, ConfigError, FailurePolicy};
use grimoire_scrape::{
    scraper::{HarvestReport, ScrapeError, Scraper},
    DEFAULT_LOG_FILTER,
};
use std::{path::PathBuf, process};
use tracing_subscriber::EnvFilter;

/// Everything went fine
const EXIT_OK: i32 = 0;
/// The harvest could not run, or was aborted
const EXIT_FATAL: i32 = 1;
/// The harvest finished, but some articles are missing
const EXIT_PARTIAL: i32 = 2;

/// Harvests the rules reference text of the D&D 5e wiki into one text file per article
#[derive(Debug, Parser)]
#[command(name = "grimoire_scrape", version)]
struct Args {
    /// TOML file to read settings from. Flags given here take precedence over it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root of the wiki
    #[arg(short, long)]
    base_url: Option<String>,

    /// Directory the `<category>_data` folders are created in
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Only harvest this category. Can be given several times.
    #[arg(short = 'k', long = "category")]
    categories: Vec<String>,

    /// Maximum number of articles to process per category
    #[arg(short = 'l', long)]
    article_limit: Option<usize>,

    /// What to do when an article can't be fetched, parsed or saved:
    /// skip, abort-category or abort-run
    #[arg(short = 'e', long = "on-error")]
    failure_policy: Option<FailurePolicy>,

    /// Fetch an article only once even if its category page links it several times
    #[arg(long)]
    dedupe: bool,

    /// Request timeout, in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Number of times to try a url before giving up
    #[arg(short, long)]
    retries: Option<u8>,

    /// List the articles of each category without fetching or saving them
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    /// Loads the config file (if any) and lays the flags over it
    fn into_config(self) -> Result<(Config, bool), ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if !self.categories.is_empty() {
            for category in self.categories.iter() {
                if !is_known_category(category) && !config.categories.contains(category) {
                    return Err(ConfigError::Invalid(format!(
                        "unknown category '{}'",
                        category
                    )));
                }
            }
            config.categories = self.categories;
        }
        if self.article_limit.is_some() {
            config.article_limit = self.article_limit;
        }
        if let Some(policy) = self.failure_policy {
            config.failure_policy = policy;
        }
        if self.dedupe {
            config.dedupe_links = true;
        }
        if let Some(timeout) = self.timeout {
            config.request.timeout_secs = timeout;
        }
        if let Some(retries) = self.retries {
            config.request.max_retries = retries;
        }

        config.validate()?;
        Ok((config, self.dry_run))
    }
}

fn main() {
    init_logging();

    let args = Args::parse();
    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Something went wrong! Specifically, this: {}", e);
            EXIT_FATAL
        }
    };

    process::exit(code)
}

fn run(args: Args) -> Result<i32, ScrapeError> {
    let (config, dry_run) = args.into_config()?;
    tracing::debug!(?config, "configuration loaded");

    let scraper = Scraper::new(config)?;

    if dry_run {
        let discovered = scraper.dry_scrape()?;
        let total: usize = discovered.iter().map(|c| c.urls.len()).sum();
        tracing::info!(articles = total, "dry run completed");

        let failed = discovered.iter().any(|c| c.error.is_some());
        return Ok(if failed { EXIT_PARTIAL } else { EXIT_OK });
    }

    tracing::info!("scraping the wiki...");
    let report = scraper.scrape()?;
    summarize(&report);

    Ok(if report.is_complete() {
        EXIT_OK
    } else {
        EXIT_PARTIAL
    })
}

fn summarize(report: &HarvestReport) {
    for category in report.categories.iter() {
        tracing::info!(
            category = %category.category,
            discovered = category.discovered,
            saved = category.saved,
            skipped = category.skipped.len(),
            "category finished"
        );
        for skipped in category.skipped.iter() {
            tracing::warn!(url = %skipped.url, reason = %skipped.reason, "not saved");
        }
    }

    for category in report.aborted() {
        tracing::warn!(
            category = %category.category,
            reason = category.aborted.as_deref().unwrap_or_default(),
            "category was aborted"
        );
    }

    if report.is_complete() {
        tracing::info!(saved = report.saved(), "scrape completed successfully!");
    } else {
        tracing::warn!(
            saved = report.saved(),
            skipped = report.skipped(),
            "scrape completed with missing articles"
        );
    }
}

fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_from(args: &[&str]) -> Result<(Config, bool), ConfigError> {
        let args = std::iter::once("grimoire_scrape").chain(args.iter().copied());
        Args::try_parse_from(args)
            .expect("Arguments should parse")
            .into_config()
    }

    #[test]
    fn defaults_without_flags() {
        let (config, dry_run) = config_from(&[]).expect("Test failed");
        assert_eq!(config, Config::default());
        assert!(!dry_run);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let result = config_from(&["--category", "spells", "--category", "vehicles"]);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn configured_category_is_accepted() {
        let dir = tempfile::tempdir().expect("Test failed");
        let path = dir.path().join("grimoire.toml");
        fs::write(&path, r#"categories = ["spells", "homebrew"]"#).expect("Test failed");

        let (config, _) = config_from(&[
            "--config",
            path.to_str().expect("Temp dir should be valid UTF-8"),
            "-k",
            "homebrew",
        ])
        .expect("Test failed");
        assert_eq!(config.categories, vec!["homebrew"]);
    }

    #[test]
    fn flags_override_the_file() {
        let dir = tempfile::tempdir().expect("Test failed");
        let path = dir.path().join("grimoire.toml");
        fs::write(
            &path,
            "failure_policy = \"abort-category\"\narticle_limit = 5\n[request]\ntimeout_secs = 10",
        )
        .expect("Test failed");

        let (config, dry_run) = config_from(&[
            "--config",
            path.to_str().expect("Temp dir should be valid UTF-8"),
            "--on-error",
            "abort-run",
            "--timeout",
            "3",
            "--dry-run",
        ])
        .expect("Test failed");

        assert_eq!(config.failure_policy, FailurePolicy::AbortRun);
        assert_eq!(config.request.timeout_secs, 3);
        assert_eq!(config.article_limit, Some(5));
        assert!(dry_run);
    }

    #[test]
    fn zero_retries_is_rejected() {
        assert!(matches!(
            config_from(&["--retries", "0"]),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(matches!(
            config_from(&["--timeout", "0"]),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn bad_policy_is_a_usage_error() {
        let result = Args::try_parse_from(["grimoire_scrape", "--on-error", "explode"]);
        assert!(result.is_err());
    }
}
