pub mod config;
pub mod layout;

pub use config::{Config, ConfigError, FailurePolicy, Markers, RequestOptions};
pub use layout::OutputLayout;

use const_format::formatcp;

/// Wiki host that articles are harvested from
pub const WIKI_HOST: &str = "dnd5e.wikidot.com";

pub const DEFAULT_BASE_URL: &str = formatcp!("https://{}", WIKI_HOST);

// Directory the category folders are created in
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// Appended to a category name to get the name of its folder
pub const FOLDER_SUFFIX: &str = "_data";

/// Every category the wiki groups its rules content into. Each name is both the path of the
/// category page and the prefix of the folder its articles are saved to.
pub const CATEGORIES: [&str; 11] = [
    "spells",
    "classes",
    "items",
    "feats",
    "racial-feats",
    "backgrounds",
    "monsters",
    "equipment",
    "abilities",
    "skills",
    "conditions",
];

/// Returns true if the name is one of the known wiki categories
pub fn is_known_category(name: &str) -> bool {
    CATEGORIES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_uses_host() {
        assert_eq!(DEFAULT_BASE_URL, "https://dnd5e.wikidot.com");
    }

    #[test]
    fn registry_is_unique() {
        for (i, a) in CATEGORIES.iter().enumerate() {
            for b in CATEGORIES.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn known_categories() {
        assert!(is_known_category("spells"));
        assert!(is_known_category("racial-feats"));
        assert!(!is_known_category("spell"));
        assert!(!is_known_category(""));
    }
}
