use crate::{CATEGORIES, DEFAULT_BASE_URL, DEFAULT_OUTPUT_DIR};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use thiserror::Error;

lazy_static! {
    static ref CLASS_NAME_PATTERN: Regex =
        Regex::new(r"^-?[_a-zA-Z][_a-zA-Z0-9-]*$").expect("hardcoded regex, shouldn't fail");
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// What to do when fetching, parsing, or saving something goes wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Log the failure, remember it in the report, and move on to the next article
    #[default]
    Skip,
    /// Stop working on the current category but carry on with the next one
    AbortCategory,
    /// Stop the whole harvest and return the failure
    AbortRun,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip" => Ok(FailurePolicy::Skip),
            "abort-category" => Ok(FailurePolicy::AbortCategory),
            "abort-run" => Ok(FailurePolicy::AbortRun),
            other => Err(format!(
                "unknown failure policy '{}', expected one of: skip, abort-category, abort-run",
                other
            )),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailurePolicy::Skip => "skip",
            FailurePolicy::AbortCategory => "abort-category",
            FailurePolicy::AbortRun => "abort-run",
        };
        f.write_str(name)
    }
}

/// The class names which mark the interesting parts of the wiki's markup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Class on the anchors of a category page that point at articles
    pub link_class: String,
    /// Class on the `h1` holding an article's title
    pub title_class: String,
    /// Class on the `div` holding an article's body
    pub content_class: String,
}

impl Default for Markers {
    fn default() -> Self {
        Markers {
            link_class: String::from("article"),
            title_class: String::from("page-title"),
            content_class: String::from("page-content"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Seconds to wait for a whole request before giving up on it
    pub timeout_secs: u64,
    /// Number of times to try a url before giving up. Only transport failures are retried.
    pub max_retries: u8,
    pub user_agent: String,
}

impl RequestOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            timeout_secs: 30,
            max_retries: 3,
            user_agent: String::from("Mozilla/5.0"),
        }
    }
}

/// Settings for a harvest. The defaults reproduce a full harvest of the wiki; a TOML file can
/// override any subset of keys and the command line can override the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the wiki. Category pages live directly below it.
    pub base_url: String,
    /// Directory the `<category>_data` folders are created in
    pub output_dir: PathBuf,
    /// Categories to harvest, in order
    pub categories: Vec<String>,
    pub failure_policy: FailurePolicy,
    /// Fetch an article only once even if a category page links it several times
    pub dedupe_links: bool,
    /// Maximum number of articles to process per category
    pub article_limit: Option<usize>,
    pub markers: Markers,
    pub request: RequestOptions,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: String::from(DEFAULT_BASE_URL),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            categories: CATEGORIES.iter().map(|c| String::from(*c)).collect(),
            failure_policy: FailurePolicy::default(),
            dedupe_links: false,
            article_limit: None,
            markers: Markers::default(),
            request: RequestOptions::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file. A missing or empty file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values that can't be checked by deserialization alone
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) url, got '{}'",
                self.base_url
            )));
        }

        if self.categories.is_empty() {
            return Err(ConfigError::Invalid(String::from(
                "at least one category is required",
            )));
        }

        for category in self.categories.iter() {
            if category.is_empty()
                || category.contains('/')
                || category.contains('\\')
                || category.chars().any(char::is_whitespace)
            {
                return Err(ConfigError::Invalid(format!(
                    "'{}' is not a usable category name",
                    category
                )));
            }
        }

        for (key, class) in [
            ("link_class", &self.markers.link_class),
            ("title_class", &self.markers.title_class),
            ("content_class", &self.markers.content_class),
        ] {
            if !CLASS_NAME_PATTERN.is_match(class) {
                return Err(ConfigError::Invalid(format!(
                    "markers.{} must be a CSS class name, got '{}'",
                    key, class
                )));
            }
        }

        if self.request.max_retries == 0 {
            return Err(ConfigError::Invalid(String::from(
                "request.max_retries must be at least 1",
            )));
        }

        if self.request.timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "request.timeout_secs must be at least 1",
            )));
        }

        Ok(())
    }

    /// Url of the page listing every article in a category
    pub fn category_url(&self, category: &str) -> String {
        join_url(&self.base_url, category)
    }

    /// Turns an href found on the wiki into an absolute url
    pub fn resolve_link(&self, href: &str) -> String {
        resolve_link(&self.base_url, href)
    }
}

/// Resolves an href against the wiki root. Absolute urls are kept as they are, and
/// protocol-relative ones (`//host/path`) get the scheme of the wiki root.
pub fn resolve_link(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        String::from(href)
    } else if href.starts_with("//") {
        let scheme = base_url.split_once("://").map_or("https", |(scheme, _)| scheme);
        format!("{}:{}", scheme, href)
    } else {
        join_url(base_url, href)
    }
}

// Concatenates the two parts with exactly one slash between them
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
